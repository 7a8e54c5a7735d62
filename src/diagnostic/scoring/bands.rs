use crate::diagnostic::domain::{BandScope, Level, LevelCatalog, LevelId, ScoringBand};
use serde::Serialize;

/// Resolution failure for a single scope. Both variants are configuration defects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no scoring band covers score {score} for {scope}")]
    LevelNotFound { score: u32, scope: BandScope },
    #[error("band for {scope} references level {level_id} missing from the level catalog")]
    LevelCatalogMismatch { level_id: LevelId, scope: BandScope },
}

/// Maps a score to a level using the first band whose inclusive range contains it.
pub struct LevelRangeResolver<'a> {
    levels: &'a LevelCatalog,
}

impl<'a> LevelRangeResolver<'a> {
    pub fn new(levels: &'a LevelCatalog) -> Self {
        Self { levels }
    }

    pub fn resolve(
        &self,
        score: u32,
        scope: BandScope,
        bands: &[ScoringBand],
    ) -> Result<&'a Level, ResolveError> {
        // Overlapping bands are an upstream data defect; supplied order decides.
        let band = bands
            .iter()
            .find(|band| band.contains(score))
            .ok_or(ResolveError::LevelNotFound { score, scope })?;

        self.levels
            .get(band.level_id)
            .ok_or(ResolveError::LevelCatalogMismatch {
                level_id: band.level_id,
                scope,
            })
    }
}

/// One defect found while checking that a band set partitions `[0, max]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoverageIssue {
    Gap {
        from: u32,
        to: u32,
    },
    Overlap {
        first: usize,
        second: usize,
        from: u32,
        to: u32,
    },
    Inverted {
        index: usize,
        min_score: u32,
        max_score: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub max_score: u32,
    pub issues: Vec<CoverageIssue>,
}

impl CoverageReport {
    pub fn is_partition(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Checks that every score in `[0, max_score]` is matched by exactly one band.
///
/// Indices in the report refer to positions in `bands`. Ranges lying entirely above
/// `max_score` are ignored.
pub fn validate_coverage(bands: &[ScoringBand], max_score: u32) -> CoverageReport {
    let mut issues = Vec::new();
    let mut ordered = Vec::with_capacity(bands.len());

    for (index, band) in bands.iter().enumerate() {
        if band.min_score > band.max_score {
            issues.push(CoverageIssue::Inverted {
                index,
                min_score: band.min_score,
                max_score: band.max_score,
            });
        } else {
            ordered.push((index, band));
        }
    }
    ordered.sort_by_key(|(_, band)| (band.min_score, band.max_score));

    let domain_end = u64::from(max_score);
    let mut next_uncovered: u64 = 0;
    let mut widest: Option<(usize, u32)> = None;

    for (index, band) in ordered {
        let min = u64::from(band.min_score);
        if min > domain_end {
            break;
        }

        if min > next_uncovered {
            issues.push(CoverageIssue::Gap {
                from: next_uncovered as u32,
                to: band.min_score - 1,
            });
        } else if let Some((first, reach)) = widest {
            if band.min_score <= reach {
                issues.push(CoverageIssue::Overlap {
                    first,
                    second: index,
                    from: band.min_score,
                    to: band.max_score.min(reach),
                });
            }
        }

        if u64::from(band.max_score) >= next_uncovered {
            next_uncovered = u64::from(band.max_score) + 1;
            widest = Some((index, band.max_score));
        }
    }

    if next_uncovered <= domain_end {
        issues.push(CoverageIssue::Gap {
            from: next_uncovered as u32,
            to: max_score,
        });
    }

    CoverageReport { max_score, issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::domain::CategoryId;

    fn catalog() -> LevelCatalog {
        LevelCatalog::new(vec![
            Level::new(LevelId(1), "L1"),
            Level::new(LevelId(2), "L2"),
            Level::new(LevelId(3), "L3"),
            Level::new(LevelId(4), "L4"),
        ])
    }

    fn general_bands() -> Vec<ScoringBand> {
        vec![
            ScoringBand::new(0, 15, LevelId(1)),
            ScoringBand::new(16, 30, LevelId(2)),
            ScoringBand::new(31, 45, LevelId(3)),
            ScoringBand::new(46, 60, LevelId(4)),
        ]
    }

    #[test]
    fn resolves_total_into_matching_band() {
        let levels = catalog();
        let resolver = LevelRangeResolver::new(&levels);

        let level = resolver
            .resolve(31, BandScope::General, &general_bands())
            .expect("31 is covered");
        assert_eq!(level.title, "L3");

        let boundary = resolver
            .resolve(30, BandScope::General, &general_bands())
            .expect("30 is covered");
        assert_eq!(boundary.title, "L2");
    }

    #[test]
    fn score_above_every_band_is_level_not_found() {
        let levels = catalog();
        let resolver = LevelRangeResolver::new(&levels);

        let err = resolver
            .resolve(61, BandScope::General, &general_bands())
            .expect_err("61 is outside 0-60");
        assert_eq!(
            err,
            ResolveError::LevelNotFound {
                score: 61,
                scope: BandScope::General
            }
        );
    }

    #[test]
    fn unknown_level_id_is_catalog_mismatch() {
        let levels = catalog();
        let resolver = LevelRangeResolver::new(&levels);
        let bands = vec![ScoringBand::new(0, 9, LevelId(42)).for_category(CategoryId(3))];

        let err = resolver
            .resolve(5, BandScope::Category(CategoryId(3)), &bands)
            .expect_err("level 42 is not in the catalog");
        assert!(matches!(
            err,
            ResolveError::LevelCatalogMismatch {
                level_id: LevelId(42),
                ..
            }
        ));
        assert!(err.to_string().contains("category 3"));
    }

    #[test]
    fn overlapping_bands_resolve_to_first_supplied() {
        let levels = catalog();
        let resolver = LevelRangeResolver::new(&levels);
        let bands = vec![
            ScoringBand::new(10, 20, LevelId(2)),
            ScoringBand::new(0, 15, LevelId(1)),
        ];

        let level = resolver
            .resolve(12, BandScope::General, &bands)
            .expect("12 matches both bands");
        assert_eq!(level.id, LevelId(2));
    }

    #[test]
    fn contiguous_bands_form_a_partition() {
        let report = validate_coverage(&general_bands(), 60);
        assert!(report.is_partition(), "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn reports_gaps_overlaps_and_inverted_bands() {
        let bands = vec![
            ScoringBand::new(0, 10, LevelId(1)),
            ScoringBand::new(8, 20, LevelId(2)),
            ScoringBand::new(25, 40, LevelId(3)),
            ScoringBand::new(9, 2, LevelId(4)),
        ];

        let report = validate_coverage(&bands, 45);

        assert_eq!(
            report.issues,
            vec![
                CoverageIssue::Inverted {
                    index: 3,
                    min_score: 9,
                    max_score: 2
                },
                CoverageIssue::Overlap {
                    first: 0,
                    second: 1,
                    from: 8,
                    to: 10
                },
                CoverageIssue::Gap { from: 21, to: 24 },
                CoverageIssue::Gap { from: 41, to: 45 },
            ]
        );
    }

    #[test]
    fn leading_gap_is_reported() {
        let bands = vec![ScoringBand::new(1, 9, LevelId(1))];
        let report = validate_coverage(&bands, 9);
        assert_eq!(report.issues, vec![CoverageIssue::Gap { from: 0, to: 0 }]);
    }

    #[test]
    fn every_score_in_partition_resolves_to_exactly_one_band() {
        let bands = general_bands();
        for score in 0..=60 {
            let matches = bands.iter().filter(|band| band.contains(score)).count();
            assert_eq!(matches, 1, "score {score} matched {matches} bands");
        }
    }
}
