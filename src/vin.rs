// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/vin.rs - VIN 校验
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

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, query_param};

mod checksum;
mod normalize;

pub use self::checksum::{
  AMBIGUOUS_CHARS, CHECK_DIGIT_INDEX, DEFAULT_MAX_PERMUTATION_DEPTH, VIN_LENGTH, WEIGHTS,
  ambiguous_alternative, check_digit, find_checksum_variant, transliterate, validate_checksum,
  validate_checksum_with_permutations,
};
pub use self::normalize::{
  ExtractedVin, ExtractionFailure, clean_vin, correct_ocr_errors, extract_vin, normalize,
  strip_leading_label,
};

/// VIN 中禁止出现的字母
pub const PROHIBITED_CHARS: [char; 3] = ['I', 'O', 'Q'];

pub const DEFAULT_MIN_DIGITS: usize = 5;

/// 格式正确但校验位不通过时默认拒绝
pub const DEFAULT_CHECKSUM_POLICY: ChecksumPolicy = ChecksumPolicy::Strict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
  NoSeventeenCharacterVin,
  InvalidCharactersInMiddle,
  WrongLength,
  ProhibitedCharacter,
  InsufficientDigits,
  ChecksumFailed,
}

impl ErrorReason {
  pub fn message(&self) -> &'static str {
    match self {
      ErrorReason::NoSeventeenCharacterVin => "no 17-character VIN found",
      ErrorReason::InvalidCharactersInMiddle => "invalid characters in middle",
      ErrorReason::WrongLength => "wrong length",
      ErrorReason::ProhibitedCharacter => "contains prohibited character (I, O or Q)",
      ErrorReason::InsufficientDigits => "insufficient digits",
      ErrorReason::ChecksumFailed => "checksum failed",
    }
  }
}

impl fmt::Display for ErrorReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.message())
  }
}

/// 校验位不通过时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumPolicy {
  /// 判为无效
  Strict,
  /// 判为有效，并以 `ChecksumFailed` 作为警告
  Lenient,
}

impl Default for ChecksumPolicy {
  fn default() -> Self {
    DEFAULT_CHECKSUM_POLICY
  }
}

impl FromStr for ChecksumPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "strict" => Ok(ChecksumPolicy::Strict),
      "lenient" => Ok(ChecksumPolicy::Lenient),
      _ => Err(format!("未知的校验策略: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VinValidationResult {
  pub is_valid: bool,
  pub checksum_valid: bool,
  pub format_valid: bool,
  pub was_trimmed: bool,
  pub error_reason: Option<ErrorReason>,
  /// 清洗后的 VIN
  pub vin: Option<String>,
  /// 经混淆字符替换后通过校验的 VIN，与 `vin` 相同时为 None
  pub checksum_variant: Option<String>,
}

impl VinValidationResult {
  fn rejected(failure: ExtractionFailure) -> Self {
    Self {
      was_trimmed: failure.was_trimmed,
      error_reason: Some(failure.reason),
      ..Default::default()
    }
  }

  fn rejected_candidate(reason: ErrorReason, candidate: ExtractedVin) -> Self {
    Self {
      was_trimmed: candidate.was_trimmed,
      error_reason: Some(reason),
      vin: Some(candidate.vin),
      ..Default::default()
    }
  }

  /// 通过校验的 VIN，优先返回替换后的变体
  pub fn accepted_vin(&self) -> Option<&str> {
    if !self.is_valid {
      return None;
    }
    self.checksum_variant.as_deref().or(self.vin.as_deref())
  }
}

#[derive(Error, Debug)]
pub enum VinValidatorError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("参数错误: {0}")]
  InvalidParameter(String),
}

/// VIN 文本校验器，构造后只读，可跨线程共享
#[derive(Debug, Clone)]
pub struct VinValidator {
  policy: ChecksumPolicy,
  min_digits: usize,
  max_permutation_depth: usize,
}

impl Default for VinValidator {
  fn default() -> Self {
    Self {
      policy: DEFAULT_CHECKSUM_POLICY,
      min_digits: DEFAULT_MIN_DIGITS,
      max_permutation_depth: DEFAULT_MAX_PERMUTATION_DEPTH,
    }
  }
}

impl VinValidator {
  pub fn builder() -> VinValidatorBuilder {
    VinValidatorBuilder::default()
  }

  pub fn policy(&self) -> ChecksumPolicy {
    self.policy
  }

  pub fn min_digits(&self) -> usize {
    self.min_digits
  }

  pub fn max_permutation_depth(&self) -> usize {
    self.max_permutation_depth
  }

  pub fn validate(&self, text: &str) -> VinValidationResult {
    let candidate = match normalize(text) {
      Ok(candidate) => candidate,
      Err(failure) => {
        debug!("未找到 VIN 候选: {}", failure.reason);
        return VinValidationResult::rejected(failure);
      }
    };

    if candidate.vin.chars().count() != VIN_LENGTH {
      return VinValidationResult::rejected_candidate(ErrorReason::WrongLength, candidate);
    }

    if candidate.vin.contains(PROHIBITED_CHARS) {
      return VinValidationResult::rejected_candidate(ErrorReason::ProhibitedCharacter, candidate);
    }

    let digits = candidate.vin.chars().filter(char::is_ascii_digit).count();
    if digits < self.min_digits {
      debug!("数字个数不足: {} < {}", digits, self.min_digits);
      return VinValidationResult::rejected_candidate(ErrorReason::InsufficientDigits, candidate);
    }

    if let Some(variant) = find_checksum_variant(&candidate.vin, self.max_permutation_depth) {
      let checksum_variant = (variant != candidate.vin).then_some(variant);
      return VinValidationResult {
        is_valid: true,
        checksum_valid: true,
        format_valid: true,
        was_trimmed: candidate.was_trimmed,
        error_reason: None,
        vin: Some(candidate.vin),
        checksum_variant,
      };
    }

    let is_valid = match self.policy {
      ChecksumPolicy::Strict => false,
      ChecksumPolicy::Lenient => {
        warn!("VIN {} 校验位不通过, 按宽松策略接受", candidate.vin);
        true
      }
    };

    VinValidationResult {
      is_valid,
      checksum_valid: false,
      format_valid: true,
      was_trimmed: candidate.was_trimmed,
      error_reason: Some(ErrorReason::ChecksumFailed),
      vin: Some(candidate.vin),
      checksum_variant: None,
    }
  }
}

/// 以默认配置校验
pub fn validate(text: &str) -> VinValidationResult {
  VinValidator::default().validate(text)
}

#[derive(Debug, Clone)]
pub struct VinValidatorBuilder {
  policy: ChecksumPolicy,
  min_digits: usize,
  max_permutation_depth: usize,
}

impl Default for VinValidatorBuilder {
  fn default() -> Self {
    Self {
      policy: DEFAULT_CHECKSUM_POLICY,
      min_digits: DEFAULT_MIN_DIGITS,
      max_permutation_depth: DEFAULT_MAX_PERMUTATION_DEPTH,
    }
  }
}

impl FromUrlWithScheme for VinValidatorBuilder {
  const SCHEME: &'static str = "vin";
}

impl FromUrl for VinValidatorBuilder {
  type Error = VinValidatorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(VinValidatorError::SchemeMismatch(format!(
        "期望校验方式 '{}', 实际校验方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Ok(Self {
      policy: query_param(url, "policy", DEFAULT_CHECKSUM_POLICY)
        .map_err(VinValidatorError::InvalidParameter)?,
      min_digits: query_param(url, "min_digits", DEFAULT_MIN_DIGITS)
        .map_err(VinValidatorError::InvalidParameter)?,
      max_permutation_depth: query_param(url, "depth", DEFAULT_MAX_PERMUTATION_DEPTH)
        .map_err(VinValidatorError::InvalidParameter)?,
    })
  }
}

impl VinValidatorBuilder {
  pub fn policy(mut self, policy: ChecksumPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn min_digits(mut self, min_digits: usize) -> Self {
    self.min_digits = min_digits;
    self
  }

  pub fn max_permutation_depth(mut self, depth: usize) -> Self {
    self.max_permutation_depth = depth;
    self
  }

  pub fn build(self) -> Result<VinValidator, VinValidatorError> {
    if self.min_digits > VIN_LENGTH {
      return Err(VinValidatorError::InvalidParameter(format!(
        "最少数字个数 {} 超过 VIN 长度 {}",
        self.min_digits, VIN_LENGTH
      )));
    }
    if self.max_permutation_depth > VIN_LENGTH {
      return Err(VinValidatorError::InvalidParameter(format!(
        "替换深度 {} 超过 VIN 长度 {}",
        self.max_permutation_depth, VIN_LENGTH
      )));
    }

    debug!(
      "VIN 校验器: 策略 {:?}, 最少数字 {}, 替换深度 {}",
      self.policy, self.min_digits, self.max_permutation_depth
    );

    Ok(VinValidator {
      policy: self.policy,
      min_digits: self.min_digits,
      max_permutation_depth: self.max_permutation_depth,
    })
  }
}
