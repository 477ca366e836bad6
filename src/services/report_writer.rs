//! 运行报告写入服务 - 业务能力层
//!
//! 只负责"把本次运行结果导出为 JSON 文件"，不关心报告里有什么

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 运行报告写入服务
pub struct ReportWriter {
    report_dir: PathBuf,
}

impl ReportWriter {
    /// 创建新的报告写入服务
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// 写入报告
    ///
    /// 文件名为 `report_<时间戳>.json`，返回写入的路径
    pub async fn write<T: Serialize>(&self, report: &T) -> Result<PathBuf> {
        let file_name = format!("report_{}.json", Local::now().format("%Y%m%d_%H%M%S"));
        self.write_as(&file_name, report).await
    }

    /// 以指定文件名写入报告
    pub async fn write_as<T: Serialize>(&self, file_name: &str, report: &T) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.report_dir)
            .await
            .with_context(|| format!("创建报告目录失败: {}", self.report_dir.display()))?;

        let path = self.report_dir.join(file_name);
        let content = serde_json::to_string_pretty(report).context("序列化报告失败")?;
        debug!("写入报告: {} ({} 字节)", path.display(), content.len());

        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("写入报告失败: {}", path.display()))?;

        info!("📄 报告已导出: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_creates_dir_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("reports"));

        let path = writer.write(&json!({"succeeded": 3})).await.unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("report_") && name.ends_with(".json"));

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["succeeded"], 3);
    }
}
