use crate::events::{AttendanceUpdate, RaidId};

/// DOM operations the reconciler needs. Views are cheap handles, the way
/// `web_sys::Element` is, so mutating a view only needs `&self`.
pub trait RaidDom {
    type View;

    /// The `.raid[data-id=…]` subtree currently in the document.
    fn find_raid(&self, raid: &RaidId) -> Option<Self::View>;
    /// Parse server markup into a detached subtree.
    fn parse_fragment(&self, html: &str) -> Option<Self::View>;

    fn is_expanded(&self, view: &Self::View) -> bool;
    fn set_expanded(&self, view: &Self::View, expanded: bool);

    /// Index of the checked attendance choice, if any.
    fn checked_choice(&self, view: &Self::View) -> Option<usize>;
    fn choice_count(&self, view: &Self::View) -> usize;
    fn check_choice(&self, view: &Self::View, index: usize);
    fn set_cancel_checked(&self, view: &Self::View, checked: bool);

    /// Swap `old` for `new` in one mutation. `false` when the document refused.
    fn replace(&mut self, old: &Self::View, new: &Self::View) -> bool;
    /// Attach attendance listeners inside a freshly inserted subtree.
    fn bind_attendance(&mut self, view: &Self::View);
    /// Re-collect the countdown elements after the document changed.
    fn refresh_timers(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The view was swapped. `selected` is the choice forced onto the new
    /// view, `None` when the snippet's own selection was kept.
    Applied { selected: Option<usize> },
    MissingView,
    UnparsableFragment,
    /// The document rejected the swap; the old view is still live.
    SwapFailed,
}

/// Which choice should be shown after the update.
///
/// The local trainer's own updates are authoritative. Anyone else's update
/// must not disturb what the local trainer currently has selected.
pub fn resolve_choice(
    update: &AttendanceUpdate,
    local_nickname: &str,
    currently_checked: Option<usize>,
) -> Option<usize> {
    if update.submitted_by(local_nickname) {
        update.choice
    } else {
        currently_checked
    }
}

/// Merge a freshly rendered raid snippet into the live page.
///
/// The server knows who is attending but not which raid panels the local
/// trainer has expanded, nor (for someone else's update) which start time the
/// trainer has picked but not yet seen confirmed. The whole raid subtree is
/// swapped and those two pieces of local state are carried across.
pub fn reconcile<D: RaidDom>(
    dom: &mut D,
    local_nickname: &str,
    update: &AttendanceUpdate,
    fragment: &str,
) -> ReconcileOutcome {
    let Some(existing) = dom.find_raid(&update.raid) else {
        return ReconcileOutcome::MissingView;
    };
    let Some(incoming) = dom.parse_fragment(fragment) else {
        return ReconcileOutcome::UnparsableFragment;
    };

    dom.set_expanded(&incoming, dom.is_expanded(&existing));

    let resolved = resolve_choice(update, local_nickname, dom.checked_choice(&existing));
    let selected = resolved.filter(|&index| index < dom.choice_count(&incoming));
    if let Some(index) = selected {
        dom.check_choice(&incoming, index);
        dom.set_cancel_checked(&incoming, false);
    }

    if !dom.replace(&existing, &incoming) {
        return ReconcileOutcome::SwapFailed;
    }
    dom.bind_attendance(&incoming);
    dom.refresh_timers();

    ReconcileOutcome::Applied { selected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct MemoryRaid {
        id: String,
        markup: String,
        expanded: Option<bool>,
        choices: Vec<bool>,
        cancel: Option<bool>,
    }

    type Handle = Rc<RefCell<MemoryRaid>>;

    /// Just enough markup reading for raid snippets: every start tag's
    /// attributes, unquoted values without spaces or quoted values.
    fn start_tags(html: &str) -> Vec<Vec<(String, String)>> {
        html.split('<')
            .skip(1)
            .filter(|tag| !tag.starts_with('/'))
            .map(|tag| {
                let tag = tag.split('>').next().unwrap_or_default();
                let mut attrs = Vec::new();
                let mut rest = tag.split_once(' ').map(|(_, rest)| rest).unwrap_or("");
                while let Some(start) = rest.find(|c: char| !c.is_whitespace()) {
                    rest = &rest[start..];
                    let name_end = rest
                        .find(|c: char| c == '=' || c.is_whitespace())
                        .unwrap_or(rest.len());
                    if name_end == 0 {
                        rest = &rest[1..];
                        continue;
                    }
                    let name = rest[..name_end].to_string();
                    rest = &rest[name_end..];
                    let value = if let Some(after) = rest.strip_prefix("=\"") {
                        let end = after.find('"').unwrap_or(after.len());
                        rest = after.get(end + 1..).unwrap_or("");
                        after[..end].to_string()
                    } else {
                        String::new()
                    };
                    attrs.push((name, value));
                }
                attrs
            })
            .collect()
    }

    fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
        attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn parse_raid(html: &str) -> Option<MemoryRaid> {
        let tags = start_tags(html);
        let root = tags.first()?;
        if attr(root, "class") != Some("raid") {
            return None;
        }
        let mut raid = MemoryRaid {
            id: attr(root, "data-id")?.to_string(),
            markup: html.to_string(),
            ..MemoryRaid::default()
        };
        for tag in &tags[1..] {
            let checked = attr(tag, "checked").is_some();
            match attr(tag, "class") {
                Some("raid-toggle") => raid.expanded = Some(checked),
                Some("raid-attendance-choice") => raid.choices.push(checked),
                Some("raid-attandance-cancel") => raid.cancel = Some(checked),
                _ => {}
            }
        }
        Some(raid)
    }

    #[derive(Default)]
    struct MemoryDocument {
        raids: Vec<Handle>,
        mutations: usize,
        bound: Vec<String>,
        timer_refreshes: usize,
        read_only: bool,
    }

    impl MemoryDocument {
        fn with_raids(snippets: &[&str]) -> Self {
            let raids = snippets
                .iter()
                .filter_map(|html| parse_raid(html))
                .map(|raid| Rc::new(RefCell::new(raid)))
                .collect();
            Self {
                raids,
                ..Self::default()
            }
        }

        fn raid(&self, id: &str) -> Handle {
            self.find_raid(&RaidId::new(id)).expect("raid in document")
        }
    }

    impl RaidDom for MemoryDocument {
        type View = Handle;

        fn find_raid(&self, raid: &RaidId) -> Option<Handle> {
            self.raids
                .iter()
                .find(|view| view.borrow().id == raid.as_str())
                .cloned()
        }

        fn parse_fragment(&self, html: &str) -> Option<Handle> {
            parse_raid(html).map(|raid| Rc::new(RefCell::new(raid)))
        }

        fn is_expanded(&self, view: &Handle) -> bool {
            view.borrow().expanded.unwrap_or(false)
        }

        fn set_expanded(&self, view: &Handle, expanded: bool) {
            if let Some(toggle) = view.borrow_mut().expanded.as_mut() {
                *toggle = expanded;
            }
        }

        fn checked_choice(&self, view: &Handle) -> Option<usize> {
            view.borrow().choices.iter().position(|&checked| checked)
        }

        fn choice_count(&self, view: &Handle) -> usize {
            view.borrow().choices.len()
        }

        fn check_choice(&self, view: &Handle, index: usize) {
            // Radio group semantics.
            for (i, checked) in view.borrow_mut().choices.iter_mut().enumerate() {
                *checked = i == index;
            }
        }

        fn set_cancel_checked(&self, view: &Handle, checked: bool) {
            if let Some(cancel) = view.borrow_mut().cancel.as_mut() {
                *cancel = checked;
            }
        }

        fn replace(&mut self, old: &Handle, new: &Handle) -> bool {
            if self.read_only {
                return false;
            }
            let Some(slot) = self.raids.iter_mut().find(|view| Rc::ptr_eq(view, old)) else {
                return false;
            };
            *slot = Rc::clone(new);
            self.mutations += 1;
            true
        }

        fn bind_attendance(&mut self, view: &Handle) {
            self.bound.push(view.borrow().id.clone());
        }

        fn refresh_timers(&mut self) {
            self.timer_refreshes += 1;
        }
    }

    const ME: &str = "Ash";

    fn snippet(id: &str, expanded: bool, choices: &[bool], cancel: bool) -> String {
        let check = |on: bool| if on { " checked" } else { "" };
        let mut html = format!(
            "<div class=\"raid\" data-id=\"{id}\"><input class=\"raid-toggle\" type=\"checkbox\"{}>",
            check(expanded)
        );
        for (i, &on) in choices.iter().enumerate() {
            html.push_str(&format!(
                "<input class=\"raid-attendance-choice\" type=\"radio\" value=\"{i}\"{}>",
                check(on)
            ));
        }
        html.push_str(&format!(
            "<input class=\"raid-attandance-cancel\" type=\"radio\"{}></div>",
            check(cancel)
        ));
        html
    }

    fn update(raid: &str, submitter: &str, choice: Option<usize>) -> AttendanceUpdate {
        AttendanceUpdate {
            raid: RaidId::new(raid),
            submitter: Some(submitter.to_string()),
            choice,
            time: None,
            snippet: None,
        }
    }

    #[test]
    fn local_update_applies_its_choice_verbatim() {
        let mut doc = MemoryDocument::with_raids(&[&snippet("1", false, &[true, false, false], false)]);
        let fragment = snippet("1", false, &[false, false, false], true);

        let outcome = reconcile(&mut doc, ME, &update("1", ME, Some(2)), &fragment);

        assert_eq!(outcome, ReconcileOutcome::Applied { selected: Some(2) });
        let raid = doc.raid("1");
        assert_eq!(raid.borrow().choices, vec![false, false, true]);
        assert_eq!(raid.borrow().cancel, Some(false));
    }

    #[test]
    fn third_party_update_keeps_local_selection() {
        let mut doc = MemoryDocument::with_raids(&[&snippet("1", false, &[false, true, false], false)]);
        let fragment = snippet("1", false, &[false, false, false], true);

        let outcome = reconcile(&mut doc, ME, &update("1", "Misty", Some(0)), &fragment);

        assert_eq!(outcome, ReconcileOutcome::Applied { selected: Some(1) });
        assert_eq!(doc.raid("1").borrow().choices, vec![false, true, false]);
        assert_eq!(doc.raid("1").borrow().cancel, Some(false));
    }

    #[test]
    fn third_party_update_is_idempotent() {
        let mut doc = MemoryDocument::with_raids(&[&snippet("1", true, &[false, false, true], false)]);
        let fragment = snippet("1", false, &[false, false, false], true);
        let event = update("1", "Misty", None);

        let first = reconcile(&mut doc, ME, &event, &fragment);
        let second = reconcile(&mut doc, ME, &event, &fragment);

        assert_eq!(first, second);
        assert_eq!(first, ReconcileOutcome::Applied { selected: Some(2) });
        assert_eq!(doc.raid("1").borrow().choices, vec![false, false, true]);
    }

    #[test]
    fn local_cancel_keeps_snippet_cancel_selected() {
        let mut doc = MemoryDocument::with_raids(&[&snippet("1", false, &[true, false], false)]);
        let fragment = snippet("1", false, &[false, false], true);

        let outcome = reconcile(&mut doc, ME, &update("1", ME, None), &fragment);

        assert_eq!(outcome, ReconcileOutcome::Applied { selected: None });
        let raid = doc.raid("1");
        assert!(raid.borrow().choices.iter().all(|&checked| !checked));
        assert_eq!(raid.borrow().cancel, Some(true));
    }

    #[test]
    fn expanded_panel_survives_refresh() {
        let mut doc = MemoryDocument::with_raids(&[&snippet("1", true, &[false], true)]);
        let fragment = snippet("1", false, &[false], true);

        reconcile(&mut doc, ME, &update("1", "Misty", None), &fragment);

        assert_eq!(doc.raid("1").borrow().expanded, Some(true));
    }

    #[test]
    fn collapsed_panel_stays_collapsed_even_if_snippet_expands_it() {
        let mut doc = MemoryDocument::with_raids(&[&snippet("1", false, &[false], true)]);
        let fragment = snippet("1", true, &[false], true);

        reconcile(&mut doc, ME, &update("1", "Misty", None), &fragment);

        assert_eq!(doc.raid("1").borrow().expanded, Some(false));
    }

    #[test]
    fn out_of_range_choice_keeps_snippet_selection() {
        let mut doc = MemoryDocument::with_raids(&[&snippet("1", false, &[false, false, false], true)]);
        let fragment = snippet("1", false, &[false, true, false], false);

        let outcome = reconcile(&mut doc, ME, &update("1", ME, Some(5)), &fragment);

        assert_eq!(outcome, ReconcileOutcome::Applied { selected: None });
        assert_eq!(doc.raid("1").borrow().choices, vec![false, true, false]);
        assert_eq!(doc.raid("1").borrow().cancel, Some(false));
    }

    #[test]
    fn missing_view_is_a_no_op() {
        let mut doc = MemoryDocument::with_raids(&[&snippet("1", false, &[false], true)]);
        let fragment = snippet("2", false, &[true], false);

        let outcome = reconcile(&mut doc, ME, &update("2", ME, Some(0)), &fragment);

        assert_eq!(outcome, ReconcileOutcome::MissingView);
        assert_eq!(doc.mutations, 0);
        assert!(doc.bound.is_empty());
        assert_eq!(doc.timer_refreshes, 0);
    }

    #[test]
    fn unparsable_fragment_leaves_view_in_place() {
        let mut doc = MemoryDocument::with_raids(&[&snippet("1", true, &[true], false)]);

        let outcome = reconcile(&mut doc, ME, &update("1", ME, Some(0)), "<p>oops</p>");

        assert_eq!(outcome, ReconcileOutcome::UnparsableFragment);
        assert_eq!(doc.mutations, 0);
        assert_eq!(doc.raid("1").borrow().expanded, Some(true));
    }

    #[test]
    fn rejected_swap_is_not_reported_as_applied() {
        let mut doc = MemoryDocument::with_raids(&[&snippet("1", true, &[true, false], false)]);
        doc.read_only = true;
        let before = doc.raid("1");
        let fragment = snippet("1", false, &[false, true], false);

        let outcome = reconcile(&mut doc, ME, &update("1", ME, Some(1)), &fragment);

        assert_eq!(outcome, ReconcileOutcome::SwapFailed);
        assert!(Rc::ptr_eq(&before, &doc.raid("1")));
        assert_eq!(before.borrow().choices, vec![true, false]);
        assert!(doc.bound.is_empty());
        assert_eq!(doc.timer_refreshes, 0);
    }

    #[test]
    fn swap_rebinds_listeners_and_refreshes_timers() {
        let mut doc = MemoryDocument::with_raids(&[
            &snippet("1", false, &[false], true),
            &snippet("2", false, &[false], true),
        ]);
        let before = doc.raid("2");
        let fragment = snippet("2", false, &[true], false);

        reconcile(&mut doc, ME, &update("2", "Misty", None), &fragment);

        let after = doc.raid("2");
        assert!(!Rc::ptr_eq(&before, &after));
        assert!(after.borrow().markup.contains("data-id=\"2\""));
        assert_eq!(doc.mutations, 1);
        assert_eq!(doc.bound, vec!["2".to_string()]);
        assert_eq!(doc.timer_refreshes, 1);
        assert_eq!(doc.raids.len(), 2);
    }

    #[test]
    fn resolve_choice_prefers_local_authorship() {
        let mine = update("1", ME, Some(2));
        let theirs = update("1", "Misty", Some(2));

        assert_eq!(resolve_choice(&mine, ME, Some(0)), Some(2));
        assert_eq!(resolve_choice(&theirs, ME, Some(0)), Some(0));
        assert_eq!(resolve_choice(&theirs, ME, None), None);
    }
}
