use std::{fmt, str::FromStr};

pub const MIN_UNIT: u32 = 1;
pub const MAX_UNIT: u32 = 30;

/// Inclusive range of course units, always within `MIN_UNIT..=MAX_UNIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitRange {
    start: u32,
    end: u32,
}

impl UnitRange {
    pub fn new(start: u32, end: u32) -> Option<Self> {
        let in_bounds = |unit: u32| (MIN_UNIT..=MAX_UNIT).contains(&unit);
        if in_bounds(start) && in_bounds(end) && start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn single(unit: u32) -> Option<Self> {
        Self::new(unit, unit)
    }

    pub fn start(self) -> u32 {
        self.start
    }

    pub fn end(self) -> u32 {
        self.end
    }

    pub fn contains(self, unit: u32) -> bool {
        (self.start..=self.end).contains(&unit)
    }
}

impl Default for UnitRange {
    fn default() -> Self {
        Self { start: 1, end: 10 }
    }
}

impl fmt::Display for UnitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseUnitRangeError;

impl FromStr for UnitRange {
    type Err = ParseUnitRangeError;

    /// Accepts `"u"` or `"a-b"`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let parse_unit = |part: &str| part.trim().parse::<u32>().map_err(|_| ParseUnitRangeError);
        let range = match input.split_once('-') {
            Some((start, end)) => Self::new(parse_unit(start)?, parse_unit(end)?),
            None => Self::single(parse_unit(input)?),
        };
        range.ok_or(ParseUnitRangeError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_unit_normalizes_to_degenerate_range() {
        for unit in MIN_UNIT..=MAX_UNIT {
            let range: UnitRange = unit.to_string().parse().unwrap();
            assert_eq!(range, UnitRange::single(unit).unwrap());
            assert_eq!(range.start(), range.end());
        }
    }

    #[test]
    fn every_ordered_pair_within_bounds_parses() {
        for start in MIN_UNIT..=MAX_UNIT {
            for end in start..=MAX_UNIT {
                let range: UnitRange = format!("{start}-{end}").parse().unwrap();
                assert_eq!((range.start(), range.end()), (start, end));
            }
        }
    }

    #[test]
    fn tolerates_whitespace_around_numbers() {
        let range: UnitRange = " 3 - 7 ".parse().unwrap();
        assert_eq!((range.start(), range.end()), (3, 7));
    }

    #[test]
    fn rejects_out_of_bounds_reversed_and_malformed_input() {
        for input in [
            "", "0", "31", "31-40", "0-5", "5-31", "10-2", "a", "1-b", "1-2-3", "-3", "1.5", "1-",
        ] {
            assert!(
                input.parse::<UnitRange>().is_err(),
                "expected '{input}' to be rejected"
            );
        }
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let range = UnitRange::new(4, 6).unwrap();
        assert!(!range.contains(3));
        assert!(range.contains(4));
        assert!(range.contains(6));
        assert!(!range.contains(7));
    }

    #[test]
    fn display_round_trips_input_shape() {
        assert_eq!(UnitRange::single(9).unwrap().to_string(), "9");
        assert_eq!(UnitRange::new(1, 10).unwrap().to_string(), "1-10");
    }
}
