use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::trace;

pub(crate) const DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month padding:zero]-[day padding:zero]");

/// Current time in the local offset, or UTC when the offset cannot be determined.
#[tracing::instrument(level = "trace")]
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Parse git's strict ISO 8601 output (`%cI`).
#[tracing::instrument(level = "trace")]
pub fn parse_iso(raw: &str) -> Option<OffsetDateTime> {
    match OffsetDateTime::parse(raw.trim(), &Rfc3339) {
        Ok(dt) => Some(dt),
        Err(e) => {
            trace!("Unable to parse {:?} as an ISO date: {}", raw, e);
            None
        }
    }
}

/// `YYYY-MM-DD` in the datetime's own offset.
pub fn date_string(dt: &OffsetDateTime) -> String {
    dt.format(DATE_FORMAT).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_git_iso_dates() {
        let dt = parse_iso("2024-03-05T23:30:00+02:00\n").unwrap();
        assert_eq!(date_string(&dt), "2024-03-05");
        assert_eq!(dt.offset().whole_hours(), 2);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_iso("").is_none());
        assert!(parse_iso("yesterday").is_none());
    }
}
