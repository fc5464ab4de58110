use chrono::{DateTime, Utc};
use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 5;

/// Generates a customer-facing order reference such as `SHMBX1Q2K3AB4CD`:
/// `SH`, the millisecond timestamp in base 36, then five random base-36 characters.
///
/// Collisions are unlikely but possible; the unique index on
/// `orders.order_reference` has the final say.
pub fn generate() -> String {
    generate_at(Utc::now(), &mut rand::rng())
}

pub fn generate_at<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let mut reference = String::from("SH");
    reference.push_str(&to_base36(millis));
    for _ in 0..SUFFIX_LEN {
        reference.push(BASE36[rng.random_range(0..BASE36.len())] as char);
    }
    reference
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
