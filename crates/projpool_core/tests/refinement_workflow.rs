mod support;

use projpool_core::{
    Difficulty, ErrorKind, GenerationError, RefinementPatch, WorkflowError,
};
use support::{
    add_label, count_rows, create_project, refinement_rows_for, user, workflow, ProviderCall,
    ScriptedProvider,
};
use uuid::Uuid;

#[test]
fn generate_twice_keeps_one_row_with_latest_text() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Level the ground");
    let provider = ScriptedProvider::with_texts(["first text", "second text"]);
    let flow = workflow(&conn, &provider);

    let first = flow.generate(owner, label.id, Difficulty::Simple).unwrap();
    let second = flow.generate(owner, label.id, Difficulty::Simple).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.generated_text, "second text");
    assert_eq!(refinement_rows_for(&conn, label.id, Difficulty::Simple), 1);
    assert_eq!(count_rows(&conn, "refinements"), 1);
}

#[test]
fn generate_passes_label_and_project_context_to_provider() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Anchor the base");
    let provider = ScriptedProvider::with_texts(["Use ground anchors."]);

    workflow(&conn, &provider)
        .generate(owner, label.id, Difficulty::InDepth)
        .unwrap();

    assert_eq!(
        provider.calls(),
        vec![ProviderCall::Refine {
            label_text: "Anchor the base".to_string(),
            difficulty: Difficulty::InDepth,
            project_name: "Garden shed".to_string(),
            project_description: "Build a small shed from a kit".to_string(),
        }]
    );
}

#[test]
fn generate_failure_creates_nothing_when_absent() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Wire lights");
    let provider = ScriptedProvider::new();
    provider.push_err(GenerationError::Request("status 503".to_string()));

    let err = workflow(&conn, &provider)
        .generate(owner, label.id, Difficulty::Simple)
        .unwrap_err();

    match &err {
        WorkflowError::GenerationFailed {
            label_id,
            difficulty,
            ..
        } => {
            assert_eq!(*label_id, label.id);
            assert_eq!(*difficulty, Difficulty::Simple);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_retryable());
    assert_eq!(refinement_rows_for(&conn, label.id, Difficulty::Simple), 0);
}

#[test]
fn generate_failure_leaves_existing_text_unchanged() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Wire lights");
    let provider = ScriptedProvider::with_texts(["original"]);
    provider.push_err(GenerationError::Request("timed out".to_string()));
    let flow = workflow(&conn, &provider);
    let before = flow.generate(owner, label.id, Difficulty::Simple).unwrap();

    let err = flow
        .generate(owner, label.id, Difficulty::Simple)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    let after = flow.get_refinement(owner, before.id).unwrap();
    assert_eq!(after.refinement.generated_text, "original");
}

#[test]
fn generate_treats_blank_provider_output_as_failure() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Seal windows");
    let provider = ScriptedProvider::with_texts(["   \n"]);

    let err = workflow(&conn, &provider)
        .generate(owner, label.id, Difficulty::Intermediate)
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::GenerationFailed {
            source: GenerationError::EmptyOutput,
            ..
        }
    ));
    assert_eq!(count_rows(&conn, "refinements"), 0);
}

#[test]
fn generate_for_foreign_label_skips_provider() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Private");
    let provider = ScriptedProvider::with_texts(["never"]);
    let flow = workflow(&conn, &provider);

    let foreign = flow
        .generate(user(), label.id, Difficulty::Simple)
        .unwrap_err();
    let missing = flow
        .generate(owner, Uuid::new_v4(), Difficulty::Simple)
        .unwrap_err();

    assert!(matches!(foreign, WorkflowError::NotFoundOrForbidden));
    assert!(matches!(missing, WorkflowError::NotFoundOrForbidden));
    assert_eq!(provider.call_count(), 0);
}

#[test]
fn unknown_difficulty_is_invalid_argument() {
    let err: WorkflowError = "expert".parse::<Difficulty>().unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn generate_all_persists_every_tier_in_order() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Hang door");
    let provider = ScriptedProvider::with_texts(["easy", "medium", "hard"]);

    let refinements = workflow(&conn, &provider)
        .generate_all(owner, label.id)
        .unwrap();

    let pairs: Vec<(Difficulty, &str)> = refinements
        .iter()
        .map(|r| (r.difficulty, r.generated_text.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (Difficulty::Simple, "easy"),
            (Difficulty::Intermediate, "medium"),
            (Difficulty::InDepth, "hard"),
        ]
    );
}

#[test]
fn generate_all_aborts_entirely_when_second_tier_fails() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Hang door");
    let provider = ScriptedProvider::with_texts(["easy"]);
    provider.push_err(GenerationError::Request("status 500".to_string()));

    let err = workflow(&conn, &provider)
        .generate_all(owner, label.id)
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::GenerationFailed {
            difficulty: Difficulty::Intermediate,
            ..
        }
    ));
    assert_eq!(provider.call_count(), 2);
    assert_eq!(count_rows(&conn, "refinements"), 0);
}

#[test]
fn generate_all_failure_leaves_existing_tiers_untouched() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Hang door");
    let provider = ScriptedProvider::with_texts(["old simple", "new simple"]);
    provider.push_err(GenerationError::Request("status 500".to_string()));
    let flow = workflow(&conn, &provider);
    flow.generate(owner, label.id, Difficulty::Simple).unwrap();

    flow.generate_all(owner, label.id).unwrap_err();

    let detail = flow.get_label(owner, label.id).unwrap();
    assert_eq!(detail.refinements.len(), 1);
    assert_eq!(detail.refinements[0].generated_text, "old simple");
}

#[test]
fn generate_all_write_failure_rolls_back_earlier_tiers() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Hang door");
    let provider =
        ScriptedProvider::with_texts(["old simple", "easy", "medium", "hard", "simple again"]);
    let flow = workflow(&conn, &provider);
    flow.generate(owner, label.id, Difficulty::Simple).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER block_in_depth BEFORE INSERT ON refinements
         WHEN NEW.difficulty = 'in_depth'
         BEGIN SELECT RAISE(ABORT, 'in_depth writes blocked'); END;",
    )
    .unwrap();

    let err = flow.generate_all(owner, label.id).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PersistenceConflict);
    assert_eq!(provider.call_count(), 4);
    assert!(conn.is_autocommit());
    let detail = flow.get_label(owner, label.id).unwrap();
    assert_eq!(detail.refinements.len(), 1);
    assert_eq!(detail.refinements[0].generated_text, "old simple");
    assert_eq!(
        refinement_rows_for(&conn, label.id, Difficulty::Intermediate),
        0
    );

    let again = flow.generate(owner, label.id, Difficulty::Simple).unwrap();
    assert_eq!(again.generated_text, "simple again");
}

#[test]
fn set_manual_text_upserts_without_provider_call() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Paint trim");
    let provider = ScriptedProvider::with_texts(["generated"]);
    let flow = workflow(&conn, &provider);
    let generated = flow.generate(owner, label.id, Difficulty::Simple).unwrap();

    let manual = flow
        .set_manual_text(owner, label.id, Difficulty::Simple, "  Tape, prime, paint.  ")
        .unwrap();

    assert_eq!(manual.id, generated.id);
    assert_eq!(manual.generated_text, "Tape, prime, paint.");
    assert_eq!(provider.call_count(), 1);
    assert_eq!(refinement_rows_for(&conn, label.id, Difficulty::Simple), 1);
}

#[test]
fn set_manual_text_rejects_short_text() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Paint trim");
    let provider = ScriptedProvider::new();

    let err = workflow(&conn, &provider)
        .set_manual_text(owner, label.id, Difficulty::Simple, " abcd ")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(count_rows(&conn, "refinements"), 0);
}

#[test]
fn patch_with_both_fields_fails_and_keeps_text() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Lay floor");
    let provider = ScriptedProvider::with_texts(["original guidance"]);
    let flow = workflow(&conn, &provider);
    let refinement = flow.generate(owner, label.id, Difficulty::Simple).unwrap();
    let before = flow.get_refinement(owner, refinement.id).unwrap();

    let both = RefinementPatch {
        feedback: Some("Make it shorter".to_string()),
        generated_text: Some("replacement".to_string()),
    };
    let err = flow
        .patch_refinement(owner, refinement.id, both)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let neither = flow
        .patch_refinement(owner, refinement.id, RefinementPatch::default())
        .unwrap_err();
    assert_eq!(neither.kind(), ErrorKind::InvalidArgument);

    assert_eq!(flow.get_refinement(owner, refinement.id).unwrap(), before);
    assert_eq!(provider.call_count(), 1);
}

#[test]
fn patch_with_feedback_overwrites_with_reconstruction() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Lay floor");
    let provider = ScriptedProvider::with_texts(["original guidance", "shorter guidance"]);
    let flow = workflow(&conn, &provider);
    let refinement = flow.generate(owner, label.id, Difficulty::Intermediate).unwrap();

    let updated = flow
        .patch_refinement(
            owner,
            refinement.id,
            RefinementPatch::with_feedback("Make it shorter"),
        )
        .unwrap();

    assert_eq!(updated.id, refinement.id);
    assert_eq!(updated.generated_text, "shorter guidance");
    assert_eq!(
        provider.calls().last(),
        Some(&ProviderCall::Reconstruct {
            previous_text: "original guidance".to_string(),
            feedback: "Make it shorter".to_string(),
            label_text: "Lay floor".to_string(),
            difficulty: Difficulty::Intermediate,
        })
    );
}

#[test]
fn patch_with_feedback_failure_keeps_text() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Lay floor");
    let provider = ScriptedProvider::with_texts(["original guidance"]);
    provider.push_err(GenerationError::Request("status 429".to_string()));
    let flow = workflow(&conn, &provider);
    let refinement = flow.generate(owner, label.id, Difficulty::Simple).unwrap();

    let err = flow
        .patch_refinement(
            owner,
            refinement.id,
            RefinementPatch::with_feedback("Add safety notes"),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    let after = flow.get_refinement(owner, refinement.id).unwrap();
    assert_eq!(after.refinement.generated_text, "original guidance");
}

#[test]
fn patch_with_text_overwrites_without_provider_call() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Lay floor");
    let provider = ScriptedProvider::with_texts(["original guidance"]);
    let flow = workflow(&conn, &provider);
    let refinement = flow.generate(owner, label.id, Difficulty::Simple).unwrap();

    let updated = flow
        .patch_refinement(
            owner,
            refinement.id,
            RefinementPatch::with_generated_text("Use a level."),
        )
        .unwrap();

    assert_eq!(updated.generated_text, "Use a level.");
    assert_eq!(provider.call_count(), 1);
}

#[test]
fn patch_enforces_field_lengths() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Lay floor");
    let provider = ScriptedProvider::with_texts(["original guidance"]);
    let flow = workflow(&conn, &provider);
    let refinement = flow.generate(owner, label.id, Difficulty::Simple).unwrap();

    let cases = [
        RefinementPatch::with_feedback("meh"),
        RefinementPatch::with_feedback("f".repeat(501)),
        RefinementPatch::with_generated_text("ok"),
        RefinementPatch::with_generated_text("t".repeat(5001)),
    ];
    for patch in cases {
        let err = flow
            .patch_refinement(owner, refinement.id, patch)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
    assert_eq!(provider.call_count(), 1);
}

#[test]
fn patch_foreign_refinement_is_not_found() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Lay floor");
    let provider = ScriptedProvider::with_texts(["original guidance"]);
    let flow = workflow(&conn, &provider);
    let refinement = flow.generate(owner, label.id, Difficulty::Simple).unwrap();

    let err = flow
        .patch_refinement(
            user(),
            refinement.id,
            RefinementPatch::with_generated_text("hijacked"),
        )
        .unwrap_err();

    assert!(matches!(err, WorkflowError::NotFoundOrForbidden));
    let after = flow.get_refinement(owner, refinement.id).unwrap();
    assert_eq!(after.refinement.generated_text, "original guidance");
}

#[test]
fn get_refinement_serializes_with_input_label() {
    let conn = support::open();
    let owner = user();
    let project = create_project(&conn, owner);
    let label = add_label(&conn, owner, &project, "Lay floor");
    let provider = ScriptedProvider::with_texts(["original guidance"]);
    let flow = workflow(&conn, &provider);
    let refinement = flow.generate(owner, label.id, Difficulty::InDepth).unwrap();

    let detail = flow.get_refinement(owner, refinement.id).unwrap();
    let json = serde_json::to_value(&detail).unwrap();

    assert_eq!(json["id"], refinement.id.to_string());
    assert_eq!(json["difficulty"], "in_depth");
    assert_eq!(json["generated_text"], "original guidance");
    assert_eq!(json["input_label"]["text"], "Lay floor");
}
