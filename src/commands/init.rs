//! Initialize a new blog site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::templates::LOGO;

const CONFIG_TEMPLATE: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: ''

# URL
url: http://localhost:3000
root: /

# Directory
public_dir: public
static_dir: static
i18n_dir: languages

# Date format (Moment.js tokens)
date_format: DD MMM YYYY

# Reading time
words_per_minute: 200

# Dev server regeneration interval, in seconds
revalidate: 3600

# Content source
prismic:
  # Overridden by PRISMIC_API_ENDPOINT
  endpoint: https://your-repository.cdn.prismic.io/api/v2
  document_type: posts
  page_size: 4
  fields:
    - title
    - subtitle
    - author
  timeout_secs: 10
"#;

const ENV_TEMPLATE: &str = r#"PRISMIC_API_ENDPOINT=https://your-repository.cdn.prismic.io/api/v2
PRISMIC_ACCESS_TOKEN=
"#;

/// Initialize a new site in the given directory.
///
/// Existing files are left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("static/images"))?;

    write_if_missing(&target_dir.join("_config.yml"), CONFIG_TEMPLATE)?;
    write_if_missing(&target_dir.join(".env.example"), ENV_TEMPLATE)?;
    write_if_missing(&target_dir.join("static/images/logo.svg"), LOGO)?;

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::info!("Skipped existing file: {:?}", path);
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::debug!("Created: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn test_init_site() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        assert!(dir.path().join(".env.example").exists());
        assert!(dir.path().join("static/images/logo.svg").exists());

        let config = SiteConfig::load(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config.language, "pt-BR");
        assert_eq!(config.prismic.page_size, 4);
        assert_eq!(config.revalidate, 3600);
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: Mine\n").unwrap();

        init_site(dir.path()).unwrap();

        let config = SiteConfig::load(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config.title, "Mine");
    }
}
