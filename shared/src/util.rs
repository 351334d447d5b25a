use chrono::NaiveDate;
use chrono_tz::Tz;

/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// Unambiguous uppercase alphanumerics (no 0/O, 1/I/L); ticket IDs get
// read aloud at the counter when the scanner fails.
const ID_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const ID_RANDOM_LEN: usize = 4;

/// Generate a master ticket transaction ID: `TXN-<timestamp-suffix>-<random>`.
///
/// The suffix is seconds-precision (rolls over every ~11.5 days) and the
/// random part gives ~920k variants per second, so collisions are
/// negligible at single-venue daily volume. The store's unique index is
/// the actual guard: a duplicate insert is rejected there and the caller
/// reissues under a fresh ID.
pub fn txn_id() -> String {
    use rand::Rng;
    let suffix = (now_millis() / 1000) % 1_000_000;
    let mut rng = rand::thread_rng();
    let random: String = (0..ID_RANDOM_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("TXN-{suffix:06}-{random}")
}

/// Calendar date of a Unix-millis timestamp in the venue timezone.
pub fn venue_date(millis: i64, tz: Tz) -> NaiveDate {
    chrono::DateTime::from_timestamp_millis(millis)
        .unwrap_or(chrono::DateTime::UNIX_EPOCH)
        .with_timezone(&tz)
        .date_naive()
}

/// Today's calendar date in the venue timezone.
pub fn venue_today(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// `YYYY-MM-DD` display form of a timestamp in the venue timezone.
pub fn venue_date_string(millis: i64, tz: Tz) -> String {
    venue_date(millis, tz).format("%Y-%m-%d").to_string()
}
