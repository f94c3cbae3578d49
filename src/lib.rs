#![allow(dead_code)]
#![allow(unused_variables)]
#![allow(unused_imports)]

pub mod app_config;
pub mod error;
pub mod time_util;
pub mod trading;

use dotenv::dotenv;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::JobScheduler;

pub async fn app_init() -> anyhow::Result<()> {
    //设置env
    dotenv().ok();
    // 设置日志
    crate::app_config::log::setup_logging().await?;
    //初始化数据库连接
    crate::app_config::db::init_db().await;
    Ok(())
}

// 定义全局调度器容器，会在需要时被初始化
pub static SCHEDULER: Lazy<Mutex<Option<Arc<JobScheduler>>>> = Lazy::new(|| Mutex::new(None));

// 初始化调度器的辅助函数
pub async fn init_scheduler() -> anyhow::Result<Arc<JobScheduler>> {
    let mut lock = SCHEDULER.lock().await;

    if lock.is_none() {
        // 只有在调度器未初始化时才创建
        let scheduler = JobScheduler::new().await?;
        let arc_scheduler = Arc::new(scheduler);
        *lock = Some(Arc::clone(&arc_scheduler));
        return Ok(arc_scheduler);
    }

    // 返回已存在的调度器
    Ok(Arc::clone(lock.as_ref().unwrap()))
}

/// 日足K线，日期格式 YYYY-MM-DD，序列按日期升序消费
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DailyBar {
    date: String,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
    adj_c: f64,
}

impl DailyBar {
    pub fn builder() -> DailyBarBuilder {
        DailyBarBuilder::new()
    }
    pub fn date(&self) -> &str {
        &self.date
    }
    pub fn o(&self) -> f64 {
        self.o
    }
    pub fn h(&self) -> f64 {
        self.h
    }
    pub fn l(&self) -> f64 {
        self.l
    }
    pub fn c(&self) -> f64 {
        self.c
    }
    pub fn v(&self) -> f64 {
        self.v
    }
    pub fn adj_c(&self) -> f64 {
        self.adj_c
    }
}

pub struct DailyBarBuilder {
    date: Option<String>,
    o: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    c: Option<f64>,
    v: Option<f64>,
    adj_c: Option<f64>,
}

impl DailyBarBuilder {
    pub fn new() -> Self {
        Self {
            date: None,
            o: None,
            h: None,
            l: None,
            c: None,
            v: None,
            adj_c: None,
        }
    }
    pub fn date(mut self, val: &str) -> Self {
        self.date = Some(val.to_string());
        self
    }
    pub fn o(mut self, val: f64) -> Self {
        self.o = Some(val);
        self
    }
    pub fn h(mut self, val: f64) -> Self {
        self.h = Some(val);
        self
    }
    pub fn l(mut self, val: f64) -> Self {
        self.l = Some(val);
        self
    }
    pub fn c(mut self, val: f64) -> Self {
        self.c = Some(val);
        self
    }
    pub fn v(mut self, val: f64) -> Self {
        self.v = Some(val);
        self
    }
    pub fn adj_c(mut self, val: f64) -> Self {
        self.adj_c = Some(val);
        self
    }

    pub fn build(self) -> anyhow::Result<DailyBar> {
        if let (Some(date), Some(o), Some(h), Some(l), Some(c), Some(v)) =
            (self.date, self.o, self.h, self.l, self.c, self.v)
        {
            // validate: high >= max(o,c,l), low <= min(o,c,h), volume >= 0
            if h >= o && h >= c && h >= l && l <= o && l <= c && v >= 0.0 {
                let adj_c = self.adj_c.unwrap_or(c);
                Ok(DailyBar {
                    date,
                    o,
                    h,
                    l,
                    c,
                    v,
                    adj_c,
                })
            } else {
                Err(anyhow::anyhow!("DailyBarInvalid"))
            }
        } else {
            Err(anyhow::anyhow!("DailyBarIncomplete"))
        }
    }
}

pub const ENVIRONMENT_LOCAL: &'static str = "local";
pub const ENVIRONMENT_DEV: &'static str = "dev";
pub const ENVIRONMENT_TEST: &'static str = "test";
pub const ENVIRONMENT_PROD: &'static str = "prod";
