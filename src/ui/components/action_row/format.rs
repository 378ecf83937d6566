/// Label text for a count. Nothing and zero both come out as a single space
/// so the label keeps its width without showing a literal "0".
pub fn format_count(count: Option<usize>) -> String {
    match count {
        None | Some(0) => " ".to_string(),
        Some(n) => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_for_missing_and_zero() {
        assert_eq!(format_count(None), " ");
        assert_eq!(format_count(Some(0)), " ");
    }

    #[test]
    fn plain_decimal_otherwise() {
        assert_eq!(format_count(Some(5)), "5");
        assert_eq!(format_count(Some(1000)), "1000");
        assert_eq!(format_count(Some(1_234_567)), "1234567");
    }

    #[test]
    fn matches_to_string_for_any_positive_count() {
        for n in (1..5000).step_by(37).chain([usize::MAX]) {
            assert_eq!(format_count(Some(n)), n.to_string());
        }
    }
}
