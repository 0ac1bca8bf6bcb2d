//! Import and export of whole databases.

use crate::{ExportArgs, ImportArgs};
use anyhow::{Context, Result};
use dkgmic_filters::FilterManager;

use super::save;

/// Imports a database as a new folder under the root folder.
pub fn run_import(args: ImportArgs, manager: &mut FilterManager) -> Result<()> {
    let folder = match args.title {
        Some(title) => manager.import_filters_with_title(&args.input, title),
        None => manager.import_filters(&args.input),
    }
    .with_context(|| format!("Failed to import: {}", args.input.display()))?;

    save(manager)?;

    let count = manager.tree().descendants(folder).count() - 1;
    println!("Imported {} entries into '{}'", count, manager.path_of(folder));
    Ok(())
}

/// Writes the whole hierarchy to another file.
pub fn run_export(args: ExportArgs, manager: &FilterManager) -> Result<()> {
    manager
        .export_filters(&args.output)
        .with_context(|| format!("Failed to export: {}", args.output.display()))?;
    println!("Exported to {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{find_node, open_manager};
    use dkgmic_filters::Node;

    #[test]
    fn export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open_manager(&dir.path().join("a.xml")).unwrap();
        let rf = source.tree().root_folder().unwrap();
        let folder = source.create_entry(Node::folder("Landscape"));
        source.add_entry(rf, folder, None);

        let shared = dir.path().join("shared.xml");
        run_export(ExportArgs { output: shared.clone() }, &source).unwrap();

        let db = dir.path().join("b.xml");
        let mut target = open_manager(&db).unwrap();
        run_import(
            ImportArgs {
                input: shared,
                title: Some("From a".into()),
            },
            &mut target,
        )
        .unwrap();

        let reloaded = open_manager(&db).unwrap();
        assert!(find_node(&reloaded, "From a/Landscape").is_ok());

        let missing = ImportArgs {
            input: dir.path().join("nope.xml"),
            title: None,
        };
        assert!(run_import(missing, &mut target).is_err());
    }
}
