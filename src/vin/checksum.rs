// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/vin/checksum.rs - ISO 3779 校验位
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

use std::collections::{HashSet, VecDeque};

use tracing::debug;

pub const VIN_LENGTH: usize = 17;
pub const CHECK_DIGIT_INDEX: usize = 8;

/// 各位权重，校验位（第 9 位）权重为 0
pub const WEIGHTS: [u32; VIN_LENGTH] = [8, 7, 6, 5, 4, 3, 2, 10, 0, 9, 8, 7, 6, 5, 4, 3, 2];

/// OCR 容易混淆的字符对
pub const AMBIGUOUS_CHARS: [(char, char); 5] =
  [('S', '5'), ('Z', '2'), ('B', '8'), ('A', '4'), ('G', '6')];

pub const DEFAULT_MAX_PERMUTATION_DEPTH: usize = 1;

/// 字符的音译值，不在表中的字符返回 None
pub const fn transliterate(c: char) -> Option<u32> {
  match c {
    '0'..='9' => Some(c as u32 - '0' as u32),
    'A' | 'J' => Some(1),
    'B' | 'K' | 'S' => Some(2),
    'C' | 'L' | 'T' => Some(3),
    'D' | 'M' | 'U' => Some(4),
    'E' | 'N' | 'V' => Some(5),
    'F' | 'W' => Some(6),
    'G' | 'P' | 'X' => Some(7),
    'H' | 'Y' => Some(8),
    'R' | 'Z' => Some(9),
    _ => None,
  }
}

pub fn ambiguous_alternative(c: char) -> Option<char> {
  AMBIGUOUS_CHARS.iter().find_map(|&(a, b)| {
    if c == a {
      Some(b)
    } else if c == b {
      Some(a)
    } else {
      None
    }
  })
}

/// 计算期望的校验位，长度不符或含未知字符时返回 None
pub fn check_digit(vin: &str) -> Option<char> {
  let mut len = 0;
  let mut sum = 0u32;

  for (i, c) in vin.chars().enumerate() {
    if i >= VIN_LENGTH {
      return None;
    }
    len += 1;
    if i == CHECK_DIGIT_INDEX {
      continue;
    }
    sum += transliterate(c)? * WEIGHTS[i];
  }

  if len != VIN_LENGTH {
    return None;
  }

  match sum % 11 {
    10 => Some('X'),
    r => char::from_digit(r, 10),
  }
}

pub fn validate_checksum(vin: &str) -> bool {
  match (check_digit(vin), vin.chars().nth(CHECK_DIGIT_INDEX)) {
    (Some(expected), Some(actual)) => expected == actual,
    _ => false,
  }
}

/// 广度优先搜索混淆字符替换，返回第一个通过校验的变体（包括原串）
///
/// 每一层只替换一个位置，`max_depth` 限制替换的次数，已访问的变体不再展开。
pub fn find_checksum_variant(vin: &str, max_depth: usize) -> Option<String> {
  let mut visited: HashSet<String> = HashSet::new();
  let mut queue: VecDeque<(String, usize)> = VecDeque::new();

  visited.insert(vin.to_string());
  queue.push_back((vin.to_string(), 0));

  while let Some((candidate, depth)) = queue.pop_front() {
    if validate_checksum(&candidate) {
      debug!("校验通过: {} (替换 {} 次)", candidate, depth);
      return Some(candidate);
    }
    if depth >= max_depth {
      continue;
    }

    let chars: Vec<char> = candidate.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
      let Some(alt) = ambiguous_alternative(c) else {
        continue;
      };
      let mut next = chars.clone();
      next[i] = alt;
      let next: String = next.into_iter().collect();
      if visited.insert(next.clone()) {
        queue.push_back((next, depth + 1));
      }
    }
  }

  debug!("校验失败: {} (已尝试 {} 个变体)", vin, visited.len());
  None
}

pub fn validate_checksum_with_permutations(vin: &str) -> bool {
  find_checksum_variant(vin, DEFAULT_MAX_PERMUTATION_DEPTH).is_some()
}
