//! V-grade math
//!
//! A single, invariant-checked threshold table maps composite scores to
//! bouldering grades. The same `Grade` type is used for the self-reported
//! 80% grade, the predicted grade and the per-session target grades.

use crate::error::CoachError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Bouldering grade on the V scale, stored as its ordinal (V4 → 4).
///
/// Ordinals are signed: reference grades derived by offset from a low
/// self-reported grade can go below V0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Grade(i32);

impl Grade {
    pub const fn new(ordinal: i32) -> Self {
        Grade(ordinal)
    }

    pub fn ordinal(&self) -> i32 {
        self.0
    }

    /// Grade shifted by a fixed number of V-grades, without clamping.
    pub fn offset(&self, delta: i32) -> Grade {
        Grade(self.0 + delta)
    }

    /// Absolute distance in grades
    pub fn distance(&self, other: Grade) -> u32 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

impl FromStr for Grade {
    type Err = CoachError;

    /// Accepts "V4", "v4", " V10 " and "VB" (beginner, one below V0).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let rest = trimmed
            .strip_prefix('V')
            .or_else(|| trimmed.strip_prefix('v'))
            .ok_or_else(|| CoachError::InvalidGrade(s.to_string()))?;

        if rest.eq_ignore_ascii_case("b") {
            return Ok(Grade(-1));
        }

        rest.parse::<i32>()
            .map(Grade)
            .map_err(|_| CoachError::InvalidGrade(s.to_string()))
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One row of the threshold table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeThreshold {
    pub grade: Grade,
    /// Lowest composite score that earns this grade
    pub min_composite: f64,
}

/// Ordered composite-score → grade lookup.
///
/// Rows are strictly increasing in both grade and threshold; `new` refuses
/// anything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeThresholdTable {
    rows: Vec<GradeThreshold>,
}

impl GradeThresholdTable {
    pub fn new(rows: Vec<GradeThreshold>) -> Result<Self, CoachError> {
        if rows.is_empty() {
            return Err(CoachError::GradeTableError("table is empty".to_string()));
        }

        for row in &rows {
            if !row.min_composite.is_finite() {
                return Err(CoachError::GradeTableError(format!(
                    "threshold for {} is not finite",
                    row.grade
                )));
            }
        }

        for pair in rows.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.grade <= lower.grade {
                return Err(CoachError::GradeTableError(format!(
                    "grade {} does not follow {}",
                    upper.grade, lower.grade
                )));
            }
            if upper.min_composite <= lower.min_composite {
                return Err(CoachError::GradeTableError(format!(
                    "threshold {} for {} is not above {} for {}",
                    upper.min_composite, upper.grade, lower.min_composite, lower.grade
                )));
            }
        }

        Ok(Self { rows })
    }

    /// V4 floor through V12.
    pub fn standard() -> Self {
        let rows = [
            (4, 0.0),
            (5, 0.65),
            (6, 0.75),
            (7, 0.85),
            (8, 0.95),
            (9, 1.05),
            (10, 1.15),
            (11, 1.30),
            (12, 1.45),
        ]
        .into_iter()
        .map(|(grade, min_composite)| GradeThreshold {
            grade: Grade::new(grade),
            min_composite,
        })
        .collect();

        // The literal rows above are monotonic.
        Self { rows }
    }

    /// Walk from the highest threshold down and return the first grade whose
    /// threshold the score reaches. Scores below every threshold get the floor.
    pub fn lookup(&self, composite: f64) -> Grade {
        self.rows
            .iter()
            .rev()
            .find(|row| row.min_composite <= composite)
            .or_else(|| self.rows.first())
            .map(|row| row.grade)
            .unwrap_or(Grade::new(0))
    }

    pub fn rows(&self) -> &[GradeThreshold] {
        &self.rows
    }

    pub fn floor(&self) -> Grade {
        self.rows.first().map(|r| r.grade).unwrap_or(Grade::new(0))
    }

    pub fn ceiling(&self) -> Grade {
        self.rows.last().map(|r| r.grade).unwrap_or(Grade::new(0))
    }
}

impl Default for GradeThresholdTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'de> Deserialize<'de> for GradeThresholdTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            rows: Vec<GradeThreshold>,
        }
        let raw = Raw::deserialize(deserializer)?;
        GradeThresholdTable::new(raw.rows).map_err(serde::de::Error::custom)
    }
}

/// Grade offsets from the self-reported 80% grade
pub const PROJECT_GRADE_OFFSET: i32 = 1;
pub const FLASH_GRADE_OFFSET: i32 = -1;
pub const TECHNICAL_GRADE_OFFSET: i32 = -3;
pub const ENDURANCE_GRADE_OFFSET: i32 = -4;

/// Target grades per session family, derived from the 80% grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceGrades {
    pub project: Grade,
    pub flash: Grade,
    pub technical: Grade,
    pub endurance: Grade,
}

impl ReferenceGrades {
    /// Offsets are applied without a floor; a V2 climber gets a V-2
    /// endurance grade.
    pub fn from_eighty_percent(grade: Grade) -> Self {
        Self {
            project: grade.offset(PROJECT_GRADE_OFFSET),
            flash: grade.offset(FLASH_GRADE_OFFSET),
            technical: grade.offset(TECHNICAL_GRADE_OFFSET),
            endurance: grade.offset(ENDURANCE_GRADE_OFFSET),
        }
    }
}
