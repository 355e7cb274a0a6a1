use chrono::{DateTime, Datelike, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::deal;

/// Maximum alphabetic characters carried from the customer name.
const NAME_PREFIX_LEN: usize = 4;
/// Width of the zero-padded per-day sequence suffix.
const SEQUENCE_WIDTH: usize = 3;

/// Derives the name component of a deal number: alphabetic characters only,
/// uppercased, at most four. Shorter names yield a shorter prefix.
pub fn name_prefix(customer_name: &str) -> String {
    customer_name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(NAME_PREFIX_LEN)
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Derives the date component: zero-padded day then month.
pub fn date_prefix(at: DateTime<Utc>) -> String {
    format!("{:02}{:02}", at.day(), at.month())
}

/// Composes a full deal number from its prefix and a 1-based sequence.
pub fn compose(prefix: &str, sequence: u64) -> String {
    format!("{}{:0width$}", prefix, sequence, width = SEQUENCE_WIDTH)
}

/// Computes the next deal number for a customer at the given instant by
/// counting that customer's deals sharing today's prefix.
///
/// Count-then-insert races with a concurrent creator; the caller runs this
/// inside the insert transaction and retries on a unique-constraint conflict
/// against `(customer_id, deal_number)`, so every retry observes the winner's
/// committed row and advances the sequence.
pub async fn next_deal_number<C: ConnectionTrait>(
    conn: &C,
    customer_id: Uuid,
    customer_name: &str,
    at: DateTime<Utc>,
) -> Result<String, DbErr> {
    let prefix = format!("{}{}", name_prefix(customer_name), date_prefix(at));

    let existing = deal::Entity::find()
        .filter(deal::Column::CustomerId.eq(customer_id))
        .filter(deal::Column::DealNumber.starts_with(&prefix))
        .count(conn)
        .await?;

    Ok(compose(&prefix, existing + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    #[test_case("Acme Industries", "ACME" ; "long name truncates to four")]
    #[test_case("acme", "ACME" ; "lowercase is uppercased")]
    #[test_case("A1-B2 C3", "ABC" ; "digits and punctuation are stripped")]
    #[test_case("Al", "AL" ; "short names are not padded")]
    #[test_case("42 7", "" ; "no alphabetic characters yields empty prefix")]
    fn name_prefix_cases(input: &str, expected: &str) {
        assert_eq!(name_prefix(input), expected);
    }

    #[test]
    fn date_prefix_is_day_then_month_zero_padded() {
        let at = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        assert_eq!(date_prefix(at), "0608");

        let at = Utc.with_ymd_and_hms(2026, 11, 23, 0, 0, 0).unwrap();
        assert_eq!(date_prefix(at), "2311");
    }

    #[test]
    fn compose_pads_sequence_to_three_digits() {
        assert_eq!(compose("ACME0608", 1), "ACME0608001");
        assert_eq!(compose("ACME0608", 42), "ACME0608042");
        assert_eq!(compose("ACME0608", 1000), "ACME06081000");
    }
}
