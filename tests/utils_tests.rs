// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use panelpay::utils::{parse_percentage, parse_range, turkish_cmp};
use std::cmp::Ordering;

#[test]
fn turkish_letters_sort_after_their_base() {
    assert_eq!(turkish_cmp("Cami", "Çamlık"), Ordering::Less);
    assert_eq!(turkish_cmp("Çamlık", "Dere"), Ordering::Less);
    assert_eq!(turkish_cmp("Ödül", "Oba"), Ordering::Greater);
    assert_eq!(turkish_cmp("Şişli", "Sarıyer"), Ordering::Greater);
    assert_eq!(turkish_cmp("Ilıca", "İzmir"), Ordering::Less);
}

#[test]
fn case_is_folded_before_comparing() {
    assert_eq!(turkish_cmp("ankara", "Bursa"), Ordering::Less);
    assert_eq!(turkish_cmp("Blok 2", "blok 10"), Ordering::Greater);
}

#[test]
fn range_and_percentage_parsing() {
    let r = parse_range("2024-01-01:2024-01-31").unwrap();
    assert_eq!(r.to_string(), "2024-01-01..2024-01-31");
    assert!(parse_range("2024-01-31:2024-01-01").is_err());
    assert!(parse_range("2024-01-01").is_err());
    assert!(parse_percentage("100").is_ok());
    assert!(parse_percentage("100.01").is_err());
    assert!(parse_percentage("-1").is_err());
}
