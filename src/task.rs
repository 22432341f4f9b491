// 该文件是 Shanan VIN （山南西风 · 车架号识别） 项目的一部分。
// src/task.rs - 任务调度
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

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::{model::Model, output::Render};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 只处理第一帧
pub struct OneShotTask;

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始识别...");
    let now = Instant::now();
    let result = model.infer(&frame)?;
    info!("识别完成，耗时: {:.2?}", now.elapsed());
    output.render_result(&frame, &result)?;
    info!("输出完成，总耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

pub const DEFAULT_REPEAT_TIMES: usize = 1000;
const WARMUP_TIMES: usize = 2;

/// 对第一帧重复识别，统计平均耗时
#[derive(Debug, Clone, Copy)]
pub struct RepeatShotTask {
  repeat_times: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self {
      repeat_times: DEFAULT_REPEAT_TIMES,
    }
  }
}

impl RepeatShotTask {
  pub fn with_repeat_times(mut self, repeat_times: usize) -> Self {
    self.repeat_times = repeat_times.max(1);
    self
  }

  pub fn repeat_times(&self) -> usize {
    self.repeat_times
  }
}

/// 去掉预热轮次后的平均耗时
fn average_latency(times: &[Duration]) -> Option<Duration> {
  let skip = if times.len() > WARMUP_TIMES {
    WARMUP_TIMES
  } else {
    0
  };
  let measured = &times[skip..];
  if measured.is_empty() {
    return None;
  }
  Some(measured.iter().sum::<Duration>() / measured.len() as u32)
}

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for RepeatShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务, 重复 {} 次...", self.repeat_times);
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始识别...");
    let mut times = Vec::with_capacity(self.repeat_times);
    for i in 0..self.repeat_times {
      let now = Instant::now();
      let result = model.infer(&frame)?;
      let elapsed = now.elapsed();
      info!("({})识别完成，耗时: {:.2?}", i, elapsed);
      output.render_result(&frame, &result)?;
      times.push(elapsed);
    }

    if let Some(average) = average_latency(&times) {
      warn!("平均识别时间: {:.2?}", average);
    }

    Ok(())
  }
}

/// 逐帧处理直到输入耗尽、达到帧数上限或收到中断信号
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }
}

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = mpsc::channel();

    // 每个进程只能注册一次处理函数
    if let Err(e) = ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    }) {
      warn!("无法注册中断信号处理: {}", e);
    }

    let mut frame_index: usize = 0;
    let mut now = Instant::now();
    for frame in input {
      frame_index = frame_index.wrapping_add(1);
      info!("处理第 {} 帧", frame_index);
      let result = model.infer(&frame)?;
      let elapsed_a = now.elapsed();
      output.render_result(&frame, &result)?;
      let elapsed_b = now.elapsed();
      now = Instant::now();
      info!("识别完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);
      if self.frame_number.is_some_and(|n| frame_index >= n) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，共处理 {} 帧", frame_index);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;
  use thiserror::Error;

  #[derive(Error, Debug)]
  #[error("负数输入")]
  struct NegativeInput;

  struct Doubler;

  impl Model for Doubler {
    type Input = i32;
    type Output = i32;
    type Error = NegativeInput;

    fn infer(&self, input: &i32) -> Result<i32, NegativeInput> {
      if *input < 0 {
        return Err(NegativeInput);
      }
      Ok(input * 2)
    }
  }

  #[derive(Error, Debug)]
  #[error("不会发生")]
  struct Never;

  #[derive(Default)]
  struct Collect(RefCell<Vec<(i32, i32)>>);

  impl Render<i32, i32> for &Collect {
    type Error = Never;

    fn render_result(&self, frame: &i32, result: &i32) -> Result<(), Never> {
      self.0.borrow_mut().push((*frame, *result));
      Ok(())
    }
  }

  #[test]
  fn one_shot_renders_first_frame_only() {
    let sink = Collect::default();
    OneShotTask
      .run_task(vec![1, 2, 3].into_iter(), Doubler, &sink)
      .unwrap();
    assert_eq!(*sink.0.borrow(), vec![(1, 2)]);
  }

  #[test]
  fn one_shot_without_input_fails() {
    let sink = Collect::default();
    assert!(
      OneShotTask
        .run_task(Vec::<i32>::new().into_iter(), Doubler, &sink)
        .is_err()
    );
  }

  #[test]
  fn repeat_shot_reuses_first_frame() {
    let sink = Collect::default();
    RepeatShotTask::default()
      .with_repeat_times(5)
      .run_task(vec![4, 5].into_iter(), Doubler, &sink)
      .unwrap();
    assert_eq!(*sink.0.borrow(), vec![(4, 8); 5]);
  }

  #[test]
  fn average_latency_skips_warmup() {
    let ms = Duration::from_millis;
    assert_eq!(average_latency(&[]), None);
    assert_eq!(average_latency(&[ms(9)]), Some(ms(9)));
    assert_eq!(
      average_latency(&[ms(100), ms(100), ms(2), ms(4)]),
      Some(ms(3))
    );
  }

  #[test]
  fn continuous_stops_at_frame_number_and_on_error() {
    let sink = Collect::default();
    ContinuousTask::default()
      .with_frame_number(Some(2))
      .run_task(vec![1, 2, 3].into_iter(), Doubler, &sink)
      .unwrap();
    assert_eq!(*sink.0.borrow(), vec![(1, 2), (2, 4)]);

    let sink = Collect::default();
    let result = ContinuousTask::default().run_task(vec![1, -1, 3].into_iter(), Doubler, &sink);
    assert!(result.is_err());
    assert_eq!(*sink.0.borrow(), vec![(1, 2)]);
  }
}
