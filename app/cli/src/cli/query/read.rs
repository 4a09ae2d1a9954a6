use std::str::FromStr;

#[derive(Debug, Clone)]
pub enum FromBlock {
    Number(u64),
    Last,
}

impl FromStr for FromBlock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("last") {
            Ok(FromBlock::Last)
        } else {
            s.parse::<u64>()
                .map(FromBlock::Number)
                .map_err(|_| format!("`{s}` is not a valid block number or `last`"))
        }
    }
}

/// Admin listing filter on the active flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    Active,
    Inactive,
    #[default]
    All,
}

impl StatusFilter {
    pub fn is_active(&self) -> Option<bool> {
        match self {
            StatusFilter::Active => Some(true),
            StatusFilter::Inactive => Some(false),
            StatusFilter::All => None,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            "all" => Ok(StatusFilter::All),
            other => Err(format!("unknown status `{other}` (expected active, inactive or all)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_filters() {
        assert_eq!("Active".parse::<StatusFilter>().map(|s| s.is_active()), Ok(Some(true)));
        assert_eq!("inactive".parse::<StatusFilter>().map(|s| s.is_active()), Ok(Some(false)));
        assert_eq!(StatusFilter::default().is_active(), None);
        assert!("paused".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn parses_block_numbers_and_last() {
        assert!(matches!("LAST".parse::<FromBlock>(), Ok(FromBlock::Last)));
        assert!(matches!("42".parse::<FromBlock>(), Ok(FromBlock::Number(42))));
        assert!("latest".parse::<FromBlock>().is_err());
    }
}
