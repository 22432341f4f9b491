// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/vin/normalize.rs - OCR 文本清洗与 VIN 候选提取
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

use std::sync::LazyLock;

use regex::Regex;

use crate::vin::ErrorReason;

// "VIN:", "vin no -", "VIN#", "VIN NUMBER: "
static LEADING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)^\s*VIN(?:\s*(?:NUMBER|NO|#))?(?:\s*[:#=–—-]\s*|\s+)")
    .expect("valid label regex")
});

// 不含 I、O、Q
static VIN_RUN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[A-HJ-NPR-Z0-9]{17}").expect("valid vin regex"));

/// 提取出的 VIN 候选
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedVin {
  pub vin: String,
  /// 首尾是否去除过非字母数字字符
  pub was_trimmed: bool,
}

/// 未能提取 VIN 的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionFailure {
  pub reason: ErrorReason,
  pub was_trimmed: bool,
}

/// 去掉开头的 "VIN:" 一类标签
pub fn strip_leading_label(text: &str) -> &str {
  match LEADING_LABEL.find(text) {
    Some(m) => &text[m.end()..],
    None => text,
  }
}

/// I、O、Q 不会出现在 VIN 中，按数字处理
pub fn correct_ocr_errors(text: &str) -> String {
  text
    .chars()
    .map(|c| match c {
      'I' | 'i' => '1',
      'O' | 'o' | 'Q' | 'q' => '0',
      _ => c,
    })
    .collect()
}

/// 只做 ASCII 大写转换，非 ASCII 字符保持原样并按非字母数字处理
pub fn extract_vin(text: &str) -> Result<ExtractedVin, ExtractionFailure> {
  let upper = text.trim().to_ascii_uppercase();
  let trimmed = upper
    .trim_start_matches(|c: char| !c.is_ascii_alphanumeric())
    .trim_end_matches(|c: char| !c.is_ascii_alphanumeric());
  let was_trimmed = trimmed.len() != upper.len();

  if trimmed.chars().any(|c| !c.is_ascii_alphanumeric()) {
    return Err(ExtractionFailure {
      reason: ErrorReason::InvalidCharactersInMiddle,
      was_trimmed,
    });
  }

  VIN_RUN
    .find(trimmed)
    .map(|m| ExtractedVin {
      vin: m.as_str().to_string(),
      was_trimmed,
    })
    .ok_or(ExtractionFailure {
      reason: ErrorReason::NoSeventeenCharacterVin,
      was_trimmed,
    })
}

/// 完整清洗流程：去标签 → 纠正 OCR 错误 → 提取
pub fn normalize(text: &str) -> Result<ExtractedVin, ExtractionFailure> {
  let stripped = strip_leading_label(text);
  let corrected = correct_ocr_errors(stripped);
  extract_vin(&corrected)
}

/// 同 [`normalize`]，失败时返回空字符串
pub fn clean_vin(text: &str) -> String {
  normalize(text).map(|e| e.vin).unwrap_or_default()
}
