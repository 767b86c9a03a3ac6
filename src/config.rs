/// Studio-wide booking policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Policy {
    /// Cleaning/prep days applied after every existing booking's return date.
    pub buffer_days: u32,
}

impl Policy {
    /// Reads `RENTCAL_BUFFER_DAYS`, falling back to no buffer.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let buffer_days = var("RENTCAL_BUFFER_DAYS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);
        Self { buffer_days }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_days_from_vars() {
        let policy = Policy::from_vars(|key| (key == "RENTCAL_BUFFER_DAYS").then(|| " 2 ".to_string()));
        assert_eq!(policy.buffer_days, 2);

        assert_eq!(Policy::from_vars(|_| None), Policy::default());
        assert_eq!(Policy::from_vars(|_| Some("two".into())).buffer_days, 0);
    }
}
