use serde_json::json;

use super::*;

#[test]
fn test_address_is_lowercased() {
    let address = PlayerAddress::new("0xAbCDef0000000000000000000000000000000001");
    assert_eq!(
        address.as_str(),
        "0xabcdef0000000000000000000000000000000001"
    );
}

#[test]
fn test_case_variants_are_equal() {
    let upper: PlayerAddress = "0xABCD".parse().unwrap();
    let lower: PlayerAddress = "0xabcd".parse().unwrap();

    assert_eq!(upper, lower);
}

#[test]
fn test_surrounding_whitespace_is_trimmed() {
    let address = PlayerAddress::new("  0xAB  ");
    assert_eq!(address.as_str(), "0xab");
}

#[test]
fn test_empty_address_rejected() {
    let _ignored = "".parse::<PlayerAddress>().expect_err("empty address");
    let _ignored = "   ".parse::<PlayerAddress>().expect_err("blank address");
}

#[test]
fn test_deserialize_normalizes() {
    let address: PlayerAddress = serde_json::from_value(json!("0xFFEE")).unwrap();
    assert_eq!(address.as_str(), "0xffee");
    assert_eq!(serde_json::to_value(&address).unwrap(), json!("0xffee"));
}

#[test]
fn test_ordering_is_lexicographic() {
    let mut addresses = vec![
        PlayerAddress::new("delta"),
        PlayerAddress::new("Alpha"),
        PlayerAddress::new("charlie"),
    ];
    addresses.sort();

    let sorted: Vec<&str> = addresses.iter().map(PlayerAddress::as_str).collect();
    assert_eq!(sorted, ["alpha", "charlie", "delta"]);
}
