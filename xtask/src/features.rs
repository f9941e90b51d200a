use anyhow::{Context, Result};

use crate::cargo;

/// `distrack-common` feature sets that must keep compiling.
///
/// `None` means default features; the rest are built with
/// `--no-default-features` plus the listed features.
const FEATURE_SETS: &[Option<&[&str]>] =
    &[None, Some(&[]), Some(&["test-utils"]), Some(&["platform", "test-utils"])];

pub fn check_feature_matrix() -> Result<()> {
    println!("Checking {} distrack-common feature sets...", FEATURE_SETS.len());

    for (index, set) in FEATURE_SETS.iter().enumerate() {
        let mut args = vec!["check".to_string(), "-p".into(), "distrack-common".into()];
        let label = match set {
            None => "default".to_string(),
            Some([]) => {
                args.push("--no-default-features".into());
                "none".to_string()
            }
            Some(features) => {
                let joined = features.join(",");
                args.extend(["--no-default-features".into(), "--features".into(), joined.clone()]);
                joined
            }
        };

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        println!("\n[{}/{}] cargo {}", index + 1, FEATURE_SETS.len(), args.join(" "));
        cargo(&args).with_context(|| format!("feature set '{label}' failed to compile"))?;
    }

    println!("\nAll feature sets compile");
    Ok(())
}
