use notes_core::{update, ControlModel, ErrorSignal, Msg, StatusUpdate};

#[test]
fn messages_outside_a_job_leave_ready_untouched() {
    let mut model = ControlModel::new(Some("user@example.com".to_string()));
    model.consume_dirty();

    for msg in [
        Msg::SubmissionAccepted,
        Msg::StatusReceived(StatusUpdate::Intermediate("pending".to_string())),
        Msg::StatusReceived(StatusUpdate::Failed),
        Msg::ErrorRaised(ErrorSignal::StreamEnded),
        Msg::RecoveryDue { identity: None },
    ] {
        let (next, effects) = update(model.clone(), msg);
        assert_eq!(model, next);
        assert!(effects.is_empty());
    }
}
