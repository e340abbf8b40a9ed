//! Grid templates: predefined black/white layouts, validated once and shared read-only.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::TemplateError;
use crate::slot::find_runs;

/// Coarse difficulty of a layout. Bigger grids have more and longer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridTier {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symmetry {
    Rotational180,
}

/// A template as authored: one string per row, `.` for a white cell and `#` for a block.
#[derive(Debug, Clone, Copy)]
pub struct TemplateDefinition {
    pub id: &'static str,
    pub size: usize,
    pub tier: GridTier,
    pub rows: &'static [&'static str],
}

/// A validated template.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTemplate {
    id: String,
    size: usize,
    tier: GridTier,
    symmetry: Symmetry,
    /// `true` for fillable cells.
    cells: Vec<Vec<bool>>,
    slot_lengths: Vec<usize>,
    average_slot_length: f64,
}

impl GridTemplate {
    /// Parse and validate a square template. It must have exactly `size` rows of `size` cells,
    /// contain only `.` and `#`, look the same when rotated 180°, and contain at least one slot.
    pub fn parse(
        id: &str,
        size: usize,
        tier: GridTier,
        rows: &[&str],
    ) -> Result<GridTemplate, TemplateError> {
        if rows.len() != size {
            return Err(TemplateError::WrongRowCount {
                id: id.to_string(),
                expected: size,
                found: rows.len(),
            });
        }

        let mut cells: Vec<Vec<bool>> = Vec::with_capacity(size);
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != size {
                return Err(TemplateError::WrongRowLength {
                    id: id.to_string(),
                    row,
                    expected: size,
                    found,
                });
            }

            let parsed = line
                .chars()
                .enumerate()
                .map(|(col, cell)| match cell {
                    '.' => Ok(true),
                    '#' => Ok(false),
                    _ => Err(TemplateError::InvalidCell {
                        id: id.to_string(),
                        row,
                        col,
                        cell,
                    }),
                })
                .collect::<Result<Vec<bool>, _>>()?;
            cells.push(parsed);
        }

        for row in 0..size {
            for col in 0..size {
                if cells[row][col] != cells[size - 1 - row][size - 1 - col] {
                    return Err(TemplateError::NotSymmetric { id: id.to_string(), row, col });
                }
            }
        }

        let slot_lengths: Vec<usize> = find_runs(&cells).iter().map(|run| run.cells.len()).collect();
        if slot_lengths.is_empty() {
            return Err(TemplateError::NoSlots { id: id.to_string() });
        }
        let average_slot_length =
            slot_lengths.iter().sum::<usize>() as f64 / slot_lengths.len() as f64;

        Ok(GridTemplate {
            id: id.to_string(),
            size,
            tier,
            symmetry: Symmetry::Rotational180,
            cells,
            slot_lengths,
            average_slot_length,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tier(&self) -> GridTier {
        self.tier
    }

    pub fn symmetry(&self) -> Symmetry {
        self.symmetry
    }

    pub fn cells(&self) -> &[Vec<bool>] {
        &self.cells
    }

    pub fn is_white(&self, row: usize, col: usize) -> bool {
        self.cells[row][col]
    }

    pub fn slot_count(&self) -> usize {
        self.slot_lengths.len()
    }

    /// Lengths of every slot, in extraction order.
    pub fn slot_lengths(&self) -> &[usize] {
        &self.slot_lengths
    }

    pub fn average_slot_length(&self) -> f64 {
        self.average_slot_length
    }
}

/// The set of templates generation may choose from. Definitions that fail validation are
/// remembered in `rejected` but can never be selected.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<GridTemplate>,
    rejected: Vec<TemplateError>,
}

impl TemplateRegistry {
    /// The built-in catalog: three layouts at each of 7×7, 9×9, 11×11 and 13×13.
    pub fn builtin() -> TemplateRegistry {
        Self::from_definitions(BUILTIN_TEMPLATES)
    }

    pub fn from_definitions(definitions: &[TemplateDefinition]) -> TemplateRegistry {
        let mut registry = TemplateRegistry::default();

        for definition in definitions {
            match GridTemplate::parse(definition.id, definition.size, definition.tier, definition.rows)
            {
                Ok(template) => registry.templates.push(template),
                Err(err) => {
                    warn!("Rejecting grid template: {err}");
                    registry.rejected.push(err);
                }
            }
        }

        registry
    }

    pub fn all(&self) -> &[GridTemplate] {
        &self.templates
    }

    pub fn rejected(&self) -> &[TemplateError] {
        &self.rejected
    }

    pub fn by_size(&self, size: usize) -> impl Iterator<Item = &GridTemplate> {
        self.templates.iter().filter(move |t| t.size == size)
    }

    pub fn by_tier(&self, tier: GridTier) -> impl Iterator<Item = &GridTemplate> {
        self.templates.iter().filter(move |t| t.tier == tier)
    }

    pub fn get(&self, id: &str) -> Option<&GridTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }
}

pub(crate) const BUILTIN_TEMPLATES: &[TemplateDefinition] = &[
    TemplateDefinition {
        id: "classic-7a",
        size: 7,
        tier: GridTier::Beginner,
        rows: &["...#...", ".#.#.#.", ".......", "##.#.##", ".......", ".#.#.#.", "...#..."],
    },
    TemplateDefinition {
        id: "classic-7b",
        size: 7,
        tier: GridTier::Beginner,
        rows: &["#.#.##.", "#......", ".....#.", ".#.#.#.", ".#.....", "......#", ".##.#.#"],
    },
    TemplateDefinition {
        id: "classic-7c",
        size: 7,
        tier: GridTier::Beginner,
        rows: &["###.#.#", ".#.....", "......#", ".#...#.", "#......", ".....#.", "#.#.###"],
    },
    TemplateDefinition {
        id: "classic-9a",
        size: 9,
        tier: GridTier::Intermediate,
        rows: &[
            "......###",
            ".###.#...",
            ".##....#.",
            "#......#.",
            ".##.#.##.",
            ".#......#",
            ".#....##.",
            "...#.###.",
            "###......",
        ],
    },
    TemplateDefinition {
        id: "classic-9b",
        size: 9,
        tier: GridTier::Intermediate,
        rows: &[
            ".....###.",
            ".###.....",
            "...#...#.",
            ".#.....##",
            "##.###.##",
            "##.....#.",
            ".#...#...",
            ".....###.",
            ".###.....",
        ],
    },
    TemplateDefinition {
        id: "classic-9c",
        size: 9,
        tier: GridTier::Intermediate,
        rows: &[
            "##....#.#",
            ".#.###...",
            "........#",
            ".####....",
            ".##.#.##.",
            "....####.",
            "#........",
            "...###.#.",
            "#.#....##",
        ],
    },
    TemplateDefinition {
        id: "classic-11a",
        size: 11,
        tier: GridTier::Advanced,
        rows: &[
            "#.....###.#",
            "##.#......#",
            ".#....#.#.#",
            ".##.#.#.###",
            ".....#.....",
            ".###.#.###.",
            ".....#.....",
            "###.#.#.##.",
            "#.#.#....#.",
            "#......#.##",
            "#.###.....#",
        ],
    },
    TemplateDefinition {
        id: "classic-11b",
        size: 11,
        tier: GridTier::Advanced,
        rows: &[
            "#...####.#.",
            "##.###.....",
            "....##...#.",
            "#.#.......#",
            "#.#.#.#.#.#",
            "....#.#....",
            "#.#.#.#.#.#",
            "#.......#.#",
            ".#...##....",
            ".....###.##",
            ".#.####...#",
        ],
    },
    TemplateDefinition {
        id: "classic-11c",
        size: 11,
        tier: GridTier::Advanced,
        rows: &[
            ".#####.....",
            "....##..#.#",
            ".##.#......",
            ".##.#...#.#",
            "#...#.#....",
            "#.###.###.#",
            "....#.#...#",
            "#.#...#.##.",
            "......#.##.",
            "#.#..##....",
            ".....#####.",
        ],
    },
    TemplateDefinition {
        id: "classic-13a",
        size: 13,
        tier: GridTier::Expert,
        rows: &[
            ".###...#.....",
            ".#.#.######.#",
            ".....#......#",
            "...#.#####...",
            "#.##.#.....#.",
            "#.##...###.#.",
            ".#####.#####.",
            ".#.###...##.#",
            ".#.....#.##.#",
            "...#####.#...",
            "#......#.....",
            "#.######.#.#.",
            ".....#...###.",
        ],
    },
    TemplateDefinition {
        id: "classic-13b",
        size: 13,
        tier: GridTier::Expert,
        rows: &[
            "###.#.#....##",
            ".......##.###",
            ".#....#.#.###",
            ".#........##.",
            "####.##.##.#.",
            "###...#......",
            "#####...#####",
            "......#...###",
            ".#.##.##.####",
            ".##........#.",
            "###.#.#....#.",
            "###.##.......",
            "##....#.#.###",
        ],
    },
    TemplateDefinition {
        id: "classic-13c",
        size: 13,
        tier: GridTier::Expert,
        rows: &[
            ".####.#......",
            ".##....##.##.",
            "...##.###....",
            ".##....###.#.",
            "...#.#####.##",
            ".##....#.....",
            ".##.##.##.##.",
            ".....#....##.",
            "##.#####.#...",
            ".#.###....##.",
            "....###.##...",
            ".##.##....##.",
            "......#.####.",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::extract_slots;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let registry = TemplateRegistry::builtin();

        assert!(registry.rejected().is_empty(), "{:?}", registry.rejected());
        assert_eq!(registry.all().len(), 12);
        for size in [7, 9, 11, 13] {
            assert_eq!(registry.by_size(size).count(), 3, "size {size}");
        }
        assert_eq!(registry.by_tier(GridTier::Expert).count(), 3);
        assert!(registry.by_tier(GridTier::Expert).all(|t| t.size() == 13));
    }

    #[test]
    fn test_builtin_templates_cover_every_white_cell() {
        for template in TemplateRegistry::builtin().all() {
            let slots = extract_slots(template);
            assert_eq!(slots.len(), template.slot_count());

            for row in 0..template.size() {
                for col in 0..template.size() {
                    let covered = slots.iter().any(|s| s.cells.contains(&(row, col)));
                    assert_eq!(covered, template.is_white(row, col), "{} ({row}, {col})", template.id());
                }
            }
        }
    }

    #[test]
    fn test_computes_slot_statistics() {
        let registry = TemplateRegistry::builtin();
        let template = registry.get("classic-7a").unwrap();

        assert_eq!(template.slot_count(), 12);
        assert_eq!(template.symmetry(), Symmetry::Rotational180);
        assert!((template.average_slot_length() - 13.0 / 3.0).abs() < 1e-9);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_rejects_malformed_definitions() {
        const DEFINITIONS: &[TemplateDefinition] = &[
            TemplateDefinition {
                id: "short-row",
                size: 7,
                tier: GridTier::Beginner,
                rows: &["...#...", ".#.#.#.", ".......", "##.#.#", ".......", ".#.#.#.", "...#..."],
            },
            TemplateDefinition {
                id: "lopsided",
                size: 3,
                tier: GridTier::Beginner,
                rows: &["..#", "...", "..."],
            },
            TemplateDefinition {
                id: "bad-cell",
                size: 3,
                tier: GridTier::Beginner,
                rows: &["...", ".x.", "..."],
            },
            TemplateDefinition {
                id: "too-few-rows",
                size: 3,
                tier: GridTier::Beginner,
                rows: &["...", "..."],
            },
            TemplateDefinition {
                id: "all-blocks",
                size: 3,
                tier: GridTier::Beginner,
                rows: &["#.#", "###", "#.#"],
            },
            TemplateDefinition {
                id: "fine",
                size: 3,
                tier: GridTier::Beginner,
                rows: &["...", ".#.", "..."],
            },
        ];

        let registry = TemplateRegistry::from_definitions(DEFINITIONS);

        assert_eq!(registry.all().len(), 1);
        assert_eq!(registry.all()[0].id(), "fine");
        assert_eq!(
            registry.rejected(),
            &[
                TemplateError::WrongRowLength {
                    id: "short-row".to_string(),
                    row: 3,
                    expected: 7,
                    found: 6
                },
                TemplateError::NotSymmetric { id: "lopsided".to_string(), row: 0, col: 2 },
                TemplateError::InvalidCell {
                    id: "bad-cell".to_string(),
                    row: 1,
                    col: 1,
                    cell: 'x'
                },
                TemplateError::WrongRowCount {
                    id: "too-few-rows".to_string(),
                    expected: 3,
                    found: 2
                },
                TemplateError::NoSlots { id: "all-blocks".to_string() },
            ]
        );
    }
}
