use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use deeplink::{
    AppIdentity, HandlerRegistry, Preferences, DEEPLINK_FOLDER, HANDLERS_FILE,
    PREFERENCES_FILE,
};
use home::home_dir;

use crate::AppError;

pub fn provide_root(root_dir: &Option<PathBuf>) -> Result<PathBuf, AppError> {
    let root = match root_dir {
        Some(path) => path.clone(),
        None => home_dir()
            .ok_or(AppError::HomeDirNotFound)?
            .join(DEEPLINK_FOLDER),
    };

    std::fs::create_dir_all(&root).map_err(|e| {
        AppError::DataDirectoryCreationError(format!(
            "{}: {}",
            root.display(),
            e
        ))
    })?;
    Ok(root)
}

pub fn open_preferences(root: &Path) -> Result<Preferences, AppError> {
    Ok(Preferences::open(
        &root.join(PREFERENCES_FILE),
        AppIdentity::from_build(),
    )?)
}

pub fn open_registry(root: &Path) -> Result<HandlerRegistry, AppError> {
    Ok(HandlerRegistry::open(&root.join(HANDLERS_FILE))?)
}

/// Ask a yes/no question on the terminal, defaulting to no
pub fn confirm(question: &str) -> Result<bool, AppError> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deeplink::StoreKey;
    use tempdir::TempDir;

    #[test]
    fn explicit_root_is_created() {
        let dir = TempDir::new("deeplink-cli").unwrap();
        let root = dir.path().join("nested").join("root");

        let provided = provide_root(&Some(root.clone())).unwrap();
        assert_eq!(provided, root);
        assert!(root.is_dir());
    }

    #[test]
    fn preferences_and_handlers_share_root() {
        let dir = TempDir::new("deeplink-cli").unwrap();
        let root = provide_root(&Some(dir.path().to_path_buf())).unwrap();

        let mut preferences = open_preferences(&root).unwrap();
        preferences.set(StoreKey::Tenant, Some("acme")).unwrap();
        let mut registry = open_registry(&root).unwrap();
        registry.register("clockin", &["true"]).unwrap();

        assert!(root.join(PREFERENCES_FILE).is_file());
        assert!(root.join(HANDLERS_FILE).is_file());
        assert_eq!(
            open_preferences(&root)
                .unwrap()
                .get(StoreKey::Tenant, None)
                .as_deref(),
            Some("acme")
        );
    }
}
