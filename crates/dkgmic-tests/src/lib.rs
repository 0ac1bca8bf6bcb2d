//! Integration tests for the dkgmic crates.
//!
//! End-to-end checks of the filter database, the undo history and the
//! batch queue tool working together.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dkgmic_bqm::{
        ActionValue, BatchHost, BqmResult, BqmTool, EngineJob, EngineOutcome, FilterAction, FilterEngine, HostImage,
        HostPixels, JobControl, ToolSettings,
    };
    use dkgmic_filters::{FilterCommands, FilterDraft, FilterManager, FilterTree, Node, NodeId, NodeKind};
    use tempfile::tempdir;

    fn commands(pairs: &[(&str, &str)]) -> FilterCommands {
        pairs.iter().copied().collect()
    }

    /// Root folder with a folder, two filters and a separator.
    fn populate(manager: &mut FilterManager) -> (NodeId, NodeId) {
        let rf = manager.tree().root_folder().unwrap();

        let folder = manager.create_entry(Node::folder("Portrait"));
        manager.add_entry(rf, folder, None);
        let soft = manager.create_entry(
            Node::item("Soft", commands(&[("blur", "fx_blur 2"), ("glow", "fx_glow 10")])).with_description("gentle"),
        );
        manager.add_entry(folder, soft, None);
        let sep = manager.create_entry(Node::separator());
        manager.add_entry(folder, sep, None);
        let sharp = manager.create_entry(Node::item("Sharp & <crisp>", commands(&[("s", "fx_unsharp 1,\"a\"")])));
        manager.add_entry(rf, sharp, None);

        (folder, soft)
    }

    #[test]
    fn database_survives_reload() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("nested").join("gmicfilters.xml");

        let mut manager = FilterManager::new(&db);
        manager.commands();
        let (_, soft) = populate(&mut manager);
        let path = manager.path_of(soft);
        manager.set_current_path(path);
        manager.save().expect("Failed to save database");

        let mut reloaded = FilterManager::new(&db);
        reloaded.load().expect("Failed to load database");

        assert_eq!(reloaded.tree(), manager.tree());
        assert_eq!(reloaded.current_path(), "Portrait/Soft");
        assert_eq!(reloaded.current_command(), "fx_blur 2 fx_glow 10");
        assert!(!reloaded.undo_stack().can_undo());
    }

    #[test]
    fn corrupt_database_reports_error() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("gmicfilters.xml");
        std::fs::write(&db, "<gmicfilters><item title=\"x\"").unwrap();

        let mut manager = FilterManager::new(&db);
        assert!(manager.load().is_err());
        assert!(manager.is_loaded());

        let rf = manager.tree().root_folder().unwrap();
        assert_eq!(manager.tree().node(rf).kind(), NodeKind::RootFolder);
        assert!(manager.tree().children(rf).is_empty());
    }

    #[test]
    fn import_is_one_undo_step() {
        let dir = tempdir().unwrap();

        let mut source = FilterManager::new(dir.path().join("source.xml"));
        source.commands();
        populate(&mut source);
        let exported = dir.path().join("exported.xml");
        source.export_filters(&exported).expect("Failed to export");

        let mut target = FilterManager::new(dir.path().join("target.xml"));
        target.commands();
        let before = target.tree().clone();

        let folder = target
            .import_filters_with_title(&exported, "Shared")
            .expect("Failed to import");
        assert_eq!(target.path_of(folder), "Shared");
        let titles: Vec<_> = target
            .tree()
            .children(folder)
            .iter()
            .map(|&c| target.tree().node(c).title.clone())
            .collect();
        assert_eq!(titles, ["Portrait", "Sharp & <crisp>"]);
        let after = target.tree().clone();

        assert!(target.undo());
        assert_eq!(target.tree(), &before);
        assert!(target.redo());
        assert_eq!(target.tree(), &after);
    }

    #[test]
    fn draft_edits_then_undo() {
        let dir = tempdir().unwrap();
        let mut manager = FilterManager::new(dir.path().join("gmicfilters.xml"));
        manager.commands();
        let (folder, soft) = populate(&mut manager);
        let before = manager.tree().clone();

        let mut draft = FilterDraft::edit(&manager, soft);
        draft.title = "Dreamy".into();
        draft.description = "soft focus".into();
        draft.accept(&mut manager).unwrap();

        let mut draft = FilterDraft::new_folder(folder);
        draft.title = "Old/New".into();
        assert!(draft.accept(&mut manager).is_err());

        assert_eq!(manager.path_of(soft), "Portrait/Dreamy");
        assert_eq!(manager.undo_stack().undo_text(), Some("Edit Filter"));
        assert!(manager.undo());
        assert_eq!(manager.tree(), &before);
    }

    // ========================================================================
    // Undo history under a long edit sequence
    // ========================================================================

    /// Small deterministic generator for edit sequences.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        fn below(&mut self, n: usize) -> usize {
            (self.next() % n as u64) as usize
        }
    }

    fn attached(tree: &FilterTree) -> Vec<NodeId> {
        let rf = tree.root_folder().unwrap();
        tree.descendants(rf).collect()
    }

    fn random_edit(manager: &mut FilterManager, rng: &mut Lcg, step: usize) {
        let nodes = attached(manager.tree());
        let folders: Vec<_> = nodes
            .iter()
            .copied()
            .filter(|&n| manager.tree().node(n).kind().is_folder())
            .collect();
        let movable: Vec<_> = nodes
            .iter()
            .copied()
            .filter(|&n| manager.tree().node(n).kind() != NodeKind::RootFolder)
            .collect();
        let items: Vec<_> = nodes
            .iter()
            .copied()
            .filter(|&n| manager.tree().node(n).kind() == NodeKind::Item)
            .collect();

        match rng.below(6) {
            0 => {
                let parent = folders[rng.below(folders.len())];
                let id = manager.create_entry(Node::folder(format!("Folder {step}")));
                manager.add_entry(parent, id, None);
            }
            1 => {
                let parent = folders[rng.below(folders.len())];
                let row = rng.below(manager.tree().children(parent).len() + 1);
                let id = manager.create_entry(Node::item(format!("Filter {step}"), commands(&[("c", "fx_noop")])));
                manager.add_entry(parent, id, Some(row));
            }
            2 if !movable.is_empty() => {
                let id = movable[rng.below(movable.len())];
                manager.remove_entry(id);
            }
            3 if !movable.is_empty() => {
                let id = movable[rng.below(movable.len())];
                manager.set_title(id, format!("Renamed {step}"));
            }
            4 if !items.is_empty() => {
                let id = items[rng.below(items.len())];
                manager.set_comment(id, format!("note {step}"));
            }
            _ => {
                let parent = folders[rng.below(folders.len())];
                let id = manager.create_entry(Node::separator());
                manager.add_entry(parent, id, None);
            }
        }
    }

    #[test]
    fn undo_redo_long_sequence() {
        let dir = tempdir().unwrap();
        let mut manager = FilterManager::new(dir.path().join("gmicfilters.xml"));
        manager.commands();
        populate(&mut manager);

        let initial = manager.tree().clone();
        let mut rng = Lcg(0x5eed);
        let mut snapshots = vec![initial.clone()];
        for step in 0..200 {
            random_edit(&mut manager, &mut rng, step);
            snapshots.push(manager.tree().clone());
        }
        let final_tree = manager.tree().clone();

        for expected in snapshots.iter().rev().skip(1) {
            assert!(manager.undo());
            assert_eq!(manager.tree(), expected);
        }
        assert!(!manager.undo());
        assert_eq!(manager.tree(), &initial);

        while manager.redo() {}
        assert_eq!(manager.tree(), &final_tree);
    }

    // ========================================================================
    // Batch queue tool fed from the database selection
    // ========================================================================

    struct Invert;

    impl FilterEngine for Invert {
        fn version(&self) -> String {
            "3.3.6".into()
        }

        fn run(&self, job: EngineJob, control: &JobControl) -> EngineOutcome {
            control.set_progress(50.0);
            let images = job
                .images
                .into_iter()
                .map(|mut image| {
                    image.data.iter_mut().for_each(|v| *v = 255.0 - *v);
                    image
                })
                .collect();
            control.set_progress(100.0);
            EngineOutcome {
                result: Ok(images),
                status: vec![format!("ran '{}'", job.command)],
            }
        }
    }

    #[derive(Default)]
    struct QueueItem {
        image: Option<HostImage>,
        actions: Vec<FilterAction>,
        saved: bool,
    }

    impl BatchHost for QueueItem {
        fn load_image(&mut self) -> BqmResult<HostImage> {
            self.image
                .clone()
                .ok_or_else(|| dkgmic_bqm::BqmError::Host("nothing loaded".into()))
        }

        fn put_image(&mut self, image: HostImage) {
            self.image = Some(image);
        }

        fn add_filter_action(&mut self, action: FilterAction) {
            self.actions.push(action);
        }

        fn save_image(&mut self) -> BqmResult<()> {
            self.saved = true;
            Ok(())
        }
    }

    #[test]
    fn tool_runs_selected_filter() {
        let dir = tempdir().unwrap();
        let mut manager = FilterManager::new(dir.path().join("gmicfilters.xml"));
        manager.commands();
        let (_, soft) = populate(&mut manager);
        let path = manager.path_of(soft);
        manager.set_current_path(path);

        let mut tool = BqmTool::new(Arc::new(Invert));
        assert!(tool.update_settings(&manager));
        assert_eq!(
            tool.settings(),
            &ToolSettings {
                command: "fx_blur 2 fx_glow 10".into(),
                path: "Portrait/Soft".into(),
            }
        );

        let pixels = HostPixels::U16(vec![0, 257, 65535, 65535, 65535, 0, 0, 65535]);
        let mut item = QueueItem {
            image: Some(HostImage::from_pixels(2, 1, true, pixels).unwrap()),
            ..QueueItem::default()
        };
        tool.tool_operations(&mut item).expect("Failed to run tool");

        let image = item.image.as_ref().unwrap();
        assert!(image.sixteen_bit());
        assert_eq!(image.pixel(0, 0), Some([65535, 65278, 0, 0]));
        assert_eq!(image.pixel(1, 0), Some([0, 65535, 65535, 0]));
        assert!(item.saved);

        let action = &item.actions[0];
        assert_eq!(action.identifier, "G'MIC-Qt");
        assert_eq!(action.parameter("FilterPath"), Some(&ActionValue::from("Portrait/Soft")));
        assert_eq!(
            action.parameter("FilterName"),
            Some(&ActionValue::from("Custom command (fx_blur 2 fx_glow 10)"))
        );
    }
}
