use partledger_core::{EditorError, EditorMode, PartEntry, PartField, PartsEditor, ValidationError};
use rust_decimal::Decimal;

fn assert_columns_aligned(editor: &PartsEditor) {
    let columns = editor.columns();
    assert_eq!(columns.names.len(), editor.len());
    assert_eq!(columns.serials.len(), editor.len());
    assert_eq!(columns.prices.len(), editor.len());
}

#[derive(Clone, Copy)]
enum Step {
    Add,
    Remove(usize),
    Set(usize, PartField, &'static str),
}

fn apply(editor: &mut PartsEditor, step: Step) {
    // Misuse errors are expected for some scripted steps; the columns must
    // stay aligned either way.
    let _ = match step {
        Step::Add => {
            editor.add_row();
            Ok(())
        }
        Step::Remove(index) => editor.remove_row(index).map(|_| ()),
        Step::Set(index, field, value) => editor.update_field(index, field, value),
    };
}

#[test]
fn columns_stay_equal_length_across_scripted_sequences() {
    let scripts: Vec<Vec<Step>> = vec![
        vec![Step::Add, Step::Add, Step::Remove(1), Step::Remove(0), Step::Remove(0)],
        vec![
            Step::Set(0, PartField::Name, "Filtru"),
            Step::Add,
            Step::Set(1, PartField::Price, "12.5"),
            Step::Remove(0),
            Step::Remove(7),
            Step::Set(9, PartField::SerialNumber, "X"),
            Step::Add,
        ],
        (0..20)
            .map(|idx| if idx % 3 == 2 { Step::Remove(idx % 4) } else { Step::Add })
            .collect(),
    ];

    for script in scripts {
        let mut create = PartsEditor::new_create();
        let mut edit = PartsEditor::from_parts(&[PartEntry::new("A", "1", Decimal::ONE)]);
        for step in script {
            apply(&mut create, step);
            apply(&mut edit, step);
            assert_columns_aligned(&create);
            assert_columns_aligned(&edit);
            assert!(create.len() >= 1);
        }
    }
}

#[test]
fn remove_row_moves_all_fields_together() {
    let mut editor = PartsEditor::new_create();
    editor.add_row();
    editor.add_row();
    for (idx, name) in ["A", "B", "C"].into_iter().enumerate() {
        editor.update_field(idx, PartField::Name, name).unwrap();
        editor
            .update_field(idx, PartField::SerialNumber, format!("SN-{name}"))
            .unwrap();
        editor
            .update_field(idx, PartField::Price, format!("{}", idx + 1))
            .unwrap();
    }

    let removed = editor.remove_row(1).unwrap();
    assert_eq!(removed.name, "B");
    let columns = editor.columns();
    assert_eq!(columns.names, vec!["A", "C"]);
    assert_eq!(columns.serials, vec!["SN-A", "SN-C"]);
    assert_eq!(columns.prices, vec!["1", "3"]);
}

#[test]
fn create_mode_keeps_last_row_edit_mode_may_empty() {
    let mut create = PartsEditor::new_create();
    assert_eq!(create.mode(), EditorMode::Create);
    assert_eq!(create.remove_row(0).unwrap_err(), EditorError::LastRowRequired);

    let mut edit = PartsEditor::from_parts(&[PartEntry::new("A", "1", Decimal::ONE)]);
    assert_eq!(edit.mode(), EditorMode::Edit);
    edit.remove_row(0).unwrap();
    assert!(edit.is_empty());
    assert_eq!(edit.to_part_entries().unwrap(), Vec::new());
}

#[test]
fn to_part_entries_is_idempotent_and_does_not_mutate() {
    let mut editor = PartsEditor::new_create();
    editor.update_field(0, PartField::Name, " Filtru ").unwrap();
    editor.update_field(0, PartField::SerialNumber, " F-1 ").unwrap();
    editor.update_field(0, PartField::Price, "10.50").unwrap();
    editor.add_row();
    let before = editor.clone();

    let first = editor.to_part_entries().unwrap();
    let second = editor.to_part_entries().unwrap();
    assert_eq!(first, second);
    assert_eq!(editor, before);
    assert_eq!(first, vec![PartEntry::new("Filtru", "F-1", Decimal::new(105, 1))]);
}

#[test]
fn blank_serial_is_reported_with_row_position() {
    let mut editor = PartsEditor::new_create();
    editor.update_field(0, PartField::Name, "Filtru").unwrap();
    editor.update_field(0, PartField::Price, "10").unwrap();

    assert_eq!(
        editor.to_part_entries().unwrap_err(),
        ValidationError::MissingSerialNumber { position: 1 }
    );
}

#[test]
fn first_failing_row_wins() {
    let mut editor = PartsEditor::new_create();
    editor.add_row();
    editor.add_row();
    editor.update_field(1, PartField::SerialNumber, "ONLY-SERIAL").unwrap();
    editor.update_field(2, PartField::Name, "Ulei").unwrap();
    editor.update_field(2, PartField::SerialNumber, "U-1").unwrap();
    editor.update_field(2, PartField::Price, "abc").unwrap();

    assert_eq!(
        editor.to_part_entries().unwrap_err(),
        ValidationError::MissingPartName { position: 2 }
    );
}

#[test]
fn only_blank_rows_in_create_mode_is_no_parts() {
    let mut editor = PartsEditor::new_create();
    editor.add_row();
    assert_eq!(editor.to_part_entries().unwrap_err(), ValidationError::NoParts);
}

#[test]
fn edit_mode_shows_missing_price_as_zero() {
    let mut part = PartEntry::new("A", "1", Decimal::ONE);
    part.price = None;
    let editor = PartsEditor::from_parts(&[part]);
    assert_eq!(editor.rows()[0].price, "0");
}
