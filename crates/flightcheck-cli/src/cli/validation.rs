/// Parse a strictly positive millisecond count.
pub fn parse_millis(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("Must be greater than zero".to_string()),
        Ok(ms) => Ok(ms),
        Err(_) => Err(format!("'{s}' is not a whole number of milliseconds")),
    }
}
