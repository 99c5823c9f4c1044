//! 修改行定位模块
//!
//! 通过版本控制工具获取工作区文件相对最近一次提交的零上下文 diff，
//! 从 hunk 头中提取新文件里被新增或修改的行号。
//!
//! 这一步是整个流程中唯一会在本地吸收错误的地方：任何失败都降级为
//! 空集合，调用方把空集合理解为“未知，按全文翻译处理”。

use crate::error::{Result, TranslationError};
use crate::types::ChangedLines;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::process::Command;

/// hunk 头：`@@ -a[,b] +c[,d] @@`
static HUNK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,(\d+))? @@").expect("hunk pattern is valid")
});

/// 单个 hunk 允许的最大行数，超出视为格式错误
pub const MAX_HUNK_LINES: usize = 1_000_000;

/// 版本控制工具
///
/// 只需要一种能力：给出某个文件工作区内容与最近一次提交之间的零上下文 unified diff。
pub trait VersionControl {
    fn diff_zero_context(&self, path: &Path) -> Result<String>;
}

/// 调用 `git diff -U0 HEAD -- <file>` 的实现
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl VersionControl for GitCli {
    fn diff_zero_context(&self, path: &Path) -> Result<String> {
        let file_name = path
            .file_name()
            .ok_or_else(|| TranslationError::Diff(format!("不是文件路径: {}", path.display())))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let output = Command::new(&self.program)
            .args(["diff", "-U0", "HEAD", "--"])
            .arg(file_name)
            .current_dir(dir)
            .output()
            .map_err(|e| TranslationError::Diff(format!("无法运行 {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(TranslationError::Diff(format!(
                "{} diff 退出状态 {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| TranslationError::Diff(format!("diff 输出不是 UTF-8: {}", e)))
    }
}

/// 解析 diff 文本，返回新文件中被新增或修改的行号
///
/// 只读取 hunk 头的 `+c,d` 部分，`d` 缺省为 1，`d` 为 0（纯删除）时不贡献行号。
/// 以 `@@` 开头却无法解析的行、行号溢出或行数超过 [`MAX_HUNK_LINES`] 都视为格式错误。
///
/// # 示例
///
/// ```rust
/// use readme_translator::diff::parse_changed_lines;
///
/// let diff = "@@ -3 +3 @@\n-old\n+new\n@@ -10,0 +11,2 @@\n+a\n+b\n";
/// let lines = parse_changed_lines(diff).unwrap();
/// assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![3, 11, 12]);
/// ```
pub fn parse_changed_lines(diff: &str) -> Result<ChangedLines> {
    let mut changed_lines = ChangedLines::new();

    for line in diff.lines().filter(|l| l.starts_with("@@")) {
        let caps = HUNK_PATTERN
            .captures(line)
            .ok_or_else(|| TranslationError::Diff(format!("无法解析 hunk 头: {}", line)))?;

        let start: usize = caps[1]
            .parse()
            .map_err(|e| TranslationError::Diff(format!("hunk 起始行无效 {}: {}", line, e)))?;
        let count: usize = match caps.get(2) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|e| TranslationError::Diff(format!("hunk 行数无效 {}: {}", line, e)))?,
            None => 1,
        };

        if count > MAX_HUNK_LINES {
            return Err(TranslationError::Diff(format!("hunk 行数过大: {}", line)));
        }
        let end = start
            .checked_add(count)
            .ok_or_else(|| TranslationError::Diff(format!("hunk 行号溢出: {}", line)))?;

        debug!("hunk {} -> 新文件第 {} 行起 {} 行", line, start, count);
        changed_lines.extend(start..end);
    }

    Ok(changed_lines)
}

/// 获取文件相对最近一次提交修改过的行号
///
/// 失败时记录警告并返回空集合。diff 成功但没有任何修改时同样返回空集合，
/// 两种情况都意味着调用方应当翻译全部内容。
pub fn locate_changes<V: VersionControl + ?Sized>(vcs: &V, path: &Path) -> ChangedLines {
    match vcs
        .diff_zero_context(path)
        .and_then(|diff| parse_changed_lines(&diff))
    {
        Ok(lines) if lines.is_empty() => {
            info!("diff 中没有检测到修改行: {}", path.display());
            lines
        }
        Ok(lines) => {
            info!("检测到 {} 行修改", lines.len());
            lines
        }
        Err(e) => {
            warn!("获取 git diff 失败: {}，将翻译全部内容", e);
            ChangedLines::new()
        }
    }
}
