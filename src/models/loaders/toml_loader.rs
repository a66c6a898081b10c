use crate::models::job::Provider;
use crate::models::provider::ProviderStrategy;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 读取单个策略覆盖文件
///
/// 文件只需写出要覆盖的字段，其余字段沿用 `provider` 对应的内置策略。
/// 顶层键整体替换，不做深度合并。
pub async fn load_strategy_file(toml_file_path: &Path) -> Result<ProviderStrategy> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    parse_strategy_override(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))
}

/// 解析覆盖内容并与内置策略合并
pub fn parse_strategy_override(content: &str) -> Result<ProviderStrategy> {
    let overrides: toml::Table = toml::from_str(content)?;

    let provider: Provider = overrides
        .get("provider")
        .and_then(|v| v.as_str())
        .context("缺少 provider 字段")?
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let builtin = toml::Value::try_from(ProviderStrategy::builtin(provider))?;
    let mut merged = match builtin {
        toml::Value::Table(table) => table,
        _ => anyhow::bail!("内置策略无法序列化为表"),
    };
    for (key, value) in overrides {
        merged.insert(key, value);
    }

    let strategy: ProviderStrategy = toml::Value::Table(merged).try_into()?;
    for (key, set) in [
        ("listing_card_locators", &strategy.listing_card_locators),
        ("apply_control_locators", &strategy.apply_control_locators),
        ("submit_locators", &strategy.submit_locators),
    ] {
        if set.is_empty() {
            anyhow::bail!("{} 不能为空", key);
        }
    }
    Ok(strategy)
}

/// 在文件夹中查找目标站点的覆盖文件，找不到则返回内置策略
///
/// 解析失败的文件只记录警告，不影响运行
pub async fn apply_strategy_overrides(
    folder_path: Option<&str>,
    provider: Provider,
) -> Result<ProviderStrategy> {
    let Some(folder_path) = folder_path else {
        return Ok(ProviderStrategy::builtin(provider));
    };

    let folder = PathBuf::from(folder_path);
    if !folder.exists() {
        tracing::warn!("策略文件夹不存在: {}，使用内置策略", folder_path);
        return Ok(ProviderStrategy::builtin(provider));
    }

    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("toml") {
            continue;
        }

        match load_strategy_file(&path).await {
            Ok(strategy) if strategy.provider == provider => {
                tracing::info!(
                    "使用策略覆盖文件: {}",
                    path.file_name().unwrap_or_default().to_string_lossy()
                );
                return Ok(strategy);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("加载策略文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(ProviderStrategy::builtin(provider))
}
