use std::path::PathBuf;
use std::sync::Once;

use drhp_core::{update, ActiveDialog, AppState, DialogKind, Effect, LeftPaneView, Msg};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(drhp_logging::initialize_for_tests);
}

fn offer(state: AppState, path: &str, declared_type: Option<&str>) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::FileOffered {
            path: PathBuf::from(path),
            declared_type: declared_type.map(str::to_string),
        },
    )
}

fn previewing(path: &str, blob: u64) -> AppState {
    let (state, _) = offer(AppState::new(), path, Some("application/pdf"));
    let (state, _) = update(
        state,
        Msg::PreviewLoaded {
            path: PathBuf::from(path),
            blob,
        },
    );
    state
}

#[test]
fn pdf_moves_left_pane_to_loading_then_preview() {
    init_logging();
    let (mut state, effects) = offer(AppState::new(), "/tmp/drhp.pdf", Some("application/pdf"));

    assert_eq!(
        state.view().left,
        LeftPaneView::Loading {
            file_name: "drhp.pdf".to_string()
        }
    );
    assert_eq!(
        effects,
        vec![Effect::LoadPreview {
            path: PathBuf::from("/tmp/drhp.pdf")
        }]
    );
    assert!(state.consume_dirty());

    let (state, effects) = update(
        state,
        Msg::PreviewLoaded {
            path: PathBuf::from("/tmp/drhp.pdf"),
            blob: 7,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.view().left,
        LeftPaneView::Previewing {
            file_name: "drhp.pdf".to_string(),
            path: PathBuf::from("/tmp/drhp.pdf"),
        }
    );
    assert_eq!(state.live_blobs(), vec![7]);
}

#[test]
fn non_pdf_is_rejected_and_preview_is_kept() {
    init_logging();
    let mut state = previewing("/tmp/drhp.pdf", 3);
    state.consume_dirty();
    let before_left = state.view().left;

    for declared in [Some("image/png"), Some("text/plain"), None] {
        let (next, effects) = offer(state, "/tmp/other.bin", declared);
        assert!(effects.is_empty());
        assert_eq!(next.view().left, before_left);
        assert_eq!(next.live_blobs(), vec![3]);
        assert_eq!(
            next.view().dialog,
            Some(ActiveDialog::Warning(
                "Please upload a PDF file only.".to_string()
            ))
        );
        let (next, _) = update(next, Msg::DialogDismissed(DialogKind::Warning));
        state = next;
    }
}

#[test]
fn new_file_releases_previous_preview() {
    init_logging();
    let state = previewing("/tmp/first.pdf", 1);

    let (state, effects) = offer(state, "/tmp/second.pdf", Some("APPLICATION/PDF"));
    assert_eq!(
        effects,
        vec![
            Effect::ReleaseBlob { blob: 1 },
            Effect::LoadPreview {
                path: PathBuf::from("/tmp/second.pdf")
            },
        ]
    );
    assert!(state.live_blobs().is_empty());
}

#[test]
fn stale_preview_is_released() {
    init_logging();
    let (state, _) = offer(AppState::new(), "/tmp/first.pdf", Some("application/pdf"));
    let (state, _) = offer(state, "/tmp/second.pdf", Some("application/pdf"));

    let (state, effects) = update(
        state,
        Msg::PreviewLoaded {
            path: PathBuf::from("/tmp/first.pdf"),
            blob: 11,
        },
    );
    assert_eq!(effects, vec![Effect::ReleaseBlob { blob: 11 }]);
    assert_eq!(
        state.view().left,
        LeftPaneView::Loading {
            file_name: "second.pdf".to_string()
        }
    );
}

#[test]
fn preview_failure_returns_to_empty_with_warning() {
    init_logging();
    let (state, _) = offer(AppState::new(), "/tmp/gone.pdf", Some("application/pdf"));
    let (state, effects) = update(
        state,
        Msg::PreviewFailed {
            path: PathBuf::from("/tmp/gone.pdf"),
            message: "No such file".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.view().left, LeftPaneView::Empty);
    assert!(matches!(state.view().dialog, Some(ActiveDialog::Warning(_))));
}

#[test]
fn remove_needs_confirmation_and_releases_preview() {
    init_logging();
    let state = previewing("/tmp/drhp.pdf", 5);

    let (state, effects) = update(state, Msg::RemoveClicked);
    assert!(effects.is_empty());
    assert_eq!(state.view().dialog, Some(ActiveDialog::Remove));

    let (state, effects) = update(state, Msg::DialogDismissed(DialogKind::Remove));
    assert!(effects.is_empty());
    assert_eq!(state.view().dialog, None);
    assert_eq!(state.live_blobs(), vec![5]);

    let (state, _) = update(state, Msg::RemoveClicked);
    let (state, effects) = update(state, Msg::DialogConfirmed(DialogKind::Remove));
    assert_eq!(effects, vec![Effect::ReleaseBlob { blob: 5 }]);
    assert_eq!(state.view().left, LeftPaneView::Empty);
    assert_eq!(state.view().dialog, None);
}

#[test]
fn remove_without_file_does_nothing() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::RemoveClicked);
    assert_eq!(next, state);
    assert!(effects.is_empty());
}
