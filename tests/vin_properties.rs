// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// tests/vin_properties.rs - 车架号清洗与校验的性质测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use proptest::prelude::*;

use shanan_vin::vin::{
  AMBIGUOUS_CHARS, CHECK_DIGIT_INDEX, VIN_LENGTH, check_digit, clean_vin, normalize,
  validate_checksum, validate_checksum_with_permutations,
};

/// VIN 字母表内的 17 个字符
fn arb_vin_body() -> impl Strategy<Value = Vec<char>> {
  "[A-HJ-NPR-Z0-9]{17}".prop_map(|s| s.chars().collect())
}

/// 带标签、标点、空白与非 ASCII 噪声的 OCR 文本
fn arb_ocr_text() -> impl Strategy<Value = String> {
  prop_oneof![
    any::<String>(),
    "[ -~]{0,32}",
    "((VIN|vin|Vin)( NO| NUMBER|#)?[:#= -]{0,2})?[A-Za-z0-9ßıſİ/:;. -]{0,24}",
  ]
}

/// 有序的混淆字符对
fn arb_confusion() -> impl Strategy<Value = (char, char)> {
  (0..AMBIGUOUS_CHARS.len(), any::<bool>()).prop_map(|(i, flip)| {
    let (a, b) = AMBIGUOUS_CHARS[i];
    if flip { (b, a) } else { (a, b) }
  })
}

fn arb_position() -> impl Strategy<Value = usize> {
  (0..VIN_LENGTH).prop_filter("check digit slot", |&p| p != CHECK_DIGIT_INDEX)
}

proptest! {
  #[test]
  fn cleaning_is_idempotent(text in arb_ocr_text()) {
    let once = clean_vin(&text);
    prop_assert_eq!(clean_vin(&once), once);
  }

  #[test]
  fn cleaned_vin_is_empty_or_seventeen_ascii_characters(text in arb_ocr_text()) {
    let cleaned = clean_vin(&text);
    prop_assert!(
      cleaned.is_empty()
        || (cleaned.len() == VIN_LENGTH
          && cleaned.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()))
    );
  }

  #[test]
  fn non_ascii_noise_never_becomes_part_of_the_vin(
    body in arb_vin_body(),
    noise in "[ßıſİﬀ]{1,3}",
  ) {
    let head: String = body[..16].iter().collect();
    if let Ok(extracted) = normalize(&format!("{}{}", head, noise)) {
      prop_assert!(false, "fabricated {:?}", extracted);
    }
  }

  #[test]
  fn single_confusion_is_rescued(
    mut body in arb_vin_body(),
    (from, to) in arb_confusion(),
    position in arb_position(),
  ) {
    body[position] = from;
    let draft: String = body.iter().collect();
    body[CHECK_DIGIT_INDEX] = check_digit(&draft).unwrap();
    let valid: String = body.iter().collect();
    prop_assert!(validate_checksum(&valid));

    body[position] = to;
    let misread: String = body.iter().collect();
    prop_assert!(!validate_checksum(&misread));
    prop_assert!(validate_checksum_with_permutations(&misread));
  }
}
