// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/lib.rs - 库主文件
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

pub mod frame;
pub mod geometry;
pub mod input;
pub mod model;
pub mod output;
pub mod task;
pub mod vin;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 取出 URL 中的文件路径（已做百分号解码）
pub(crate) fn url_file_path(url: &url::Url) -> String {
  match urlencoding::decode(url.path()) {
    Ok(path) => path.into_owned(),
    Err(_) => url.path().to_string(),
  }
}

/// 解析 URL 查询参数，缺省时返回 `default`
pub(crate) fn query_param<T: std::str::FromStr>(
  url: &url::Url,
  key: &str,
  default: T,
) -> Result<T, String> {
  match url.query_pairs().find(|(k, _)| k == key) {
    Some((_, v)) => v
      .parse::<T>()
      .map_err(|_| format!("参数 {} 的值无效: {}", key, v)),
    None => Ok(default),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn query_param_falls_back_to_default() {
    let url = url::Url::parse("yolo://?size=320").unwrap();
    assert_eq!(query_param(&url, "size", 640u32), Ok(320));
    assert_eq!(query_param(&url, "iou", 0.45f32), Ok(0.45));
    assert!(query_param::<u32>(&url::Url::parse("yolo://?size=abc").unwrap(), "size", 0).is_err());
  }

  #[test]
  fn url_file_path_is_percent_decoded() {
    let url = url::Url::parse("json:///tmp/scan%20one.json").unwrap();
    assert_eq!(url_file_path(&url), "/tmp/scan one.json");
  }
}
