use partledger_core::repo::record_store::RecordRow;
use partledger_core::{
    open_db_in_memory, Lookup, PartColumns, PartField, Record, RecordForm, RecordId,
    RecordService, RecordStore, ReportConfig, RepoError, SqliteRecordStore, StoreResult,
    SubmitError, ValidationError,
};
use rust_decimal::Decimal;
use std::cell::Cell;

/// Store that records how often it was touched and holds nothing.
#[derive(Default)]
struct CountingStore {
    calls: Cell<usize>,
}

impl CountingStore {
    fn touch(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl RecordStore for &CountingStore {
    fn insert(&self, _row: &RecordRow) -> StoreResult<RecordId> {
        self.touch();
        Ok(RecordId::nil())
    }

    fn select_by_id(&self, _id: RecordId) -> StoreResult<Option<Record>> {
        self.touch();
        Ok(None)
    }

    fn select_by_vin(&self, _vin: &str) -> StoreResult<Option<Record>> {
        self.touch();
        Ok(None)
    }

    fn select_by_plate_pattern(&self, _pattern: &str) -> StoreResult<Vec<Record>> {
        self.touch();
        Ok(Vec::new())
    }

    fn update_row(&self, _id: RecordId, _row: &RecordRow) -> StoreResult<bool> {
        self.touch();
        Ok(false)
    }

    fn update_parts(&self, _id: RecordId, _parts: &PartColumns) -> StoreResult<bool> {
        self.touch();
        Ok(false)
    }

    fn delete(&self, _id: RecordId) -> StoreResult<bool> {
        self.touch();
        Ok(false)
    }
}

fn form(vin: &str, client: &str, part: (&str, &str, &str)) -> RecordForm {
    let mut form = RecordForm::new_create();
    form.vin_number = vin.to_string();
    form.client_name = client.to_string();
    form.parts.update_field(0, PartField::Name, part.0).unwrap();
    form.parts
        .update_field(0, PartField::SerialNumber, part.1)
        .unwrap();
    form.parts.update_field(0, PartField::Price, part.2).unwrap();
    form
}

#[test]
fn blank_serial_fails_validation_and_store_is_never_called() {
    let store = CountingStore::default();
    let service = RecordService::new(&store, ReportConfig::default());

    let err = service
        .submit_create(&form("1HGCM82633A004352", "Ion Popescu", ("Filtru", "", "10")))
        .unwrap_err();

    assert!(matches!(
        err,
        SubmitError::Validation(ValidationError::MissingSerialNumber { position: 1 })
    ));
    assert_eq!(err.to_string(), "part 1: serial number is required");
    assert_eq!(store.calls.get(), 0);
}

#[test]
fn missing_client_and_bad_price_never_reach_the_store() {
    let store = CountingStore::default();
    let service = RecordService::new(&store, ReportConfig::default());

    let err = service
        .submit_create(&form("VIN1", "  ", ("Filtru", "F-1", "10")))
        .unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Validation(ValidationError::MissingClientName)
    ));

    let err = service
        .submit_create(&form("VIN1", "Ana", ("Filtru", "F-1", "zece")))
        .unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Validation(ValidationError::InvalidPrice { position: 1, .. })
    ));

    let err = service
        .submit_create(&form("VIN1", "Ana", ("Filtru", "F-1", "-1")))
        .unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Validation(ValidationError::NegativePrice { position: 1 })
    ));
    assert_eq!(store.calls.get(), 0);
}

#[test]
fn blank_search_is_rejected_locally() {
    let store = CountingStore::default();
    let service = RecordService::new(&store, ReportConfig::default());

    assert!(matches!(
        service.search_by_vin("   "),
        Err(SubmitError::Validation(ValidationError::EmptySearchQuery))
    ));
    assert!(matches!(
        service.search_by_plate(""),
        Err(SubmitError::Validation(ValidationError::EmptySearchQuery))
    ));
    assert_eq!(store.calls.get(), 0);
}

#[test]
fn submit_create_then_edit_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let service = RecordService::new(SqliteRecordStore::try_new(&conn).unwrap(), ReportConfig::default());

    let mut create = form("wvwzzz1jzxw000001", "Ana Ionescu", ("Filtru", "F-1", "10"));
    create.license_plate = "b-01-abc".to_string();
    let created = service.submit_create(&create).unwrap();
    assert_eq!(created.vin_number, "WVWZZZ1JZXW000001");

    let mut edit = RecordForm::from_record(&created);
    assert_eq!(edit.license_plate, "B-01-ABC");
    edit.parts.add_row();
    edit.parts.update_field(1, PartField::Name, "Ulei").unwrap();
    edit.parts.update_field(1, PartField::SerialNumber, "U-5W30").unwrap();
    edit.parts.update_field(1, PartField::Price, "150").unwrap();
    edit.notes = "client fidel".to_string();
    let updated = service.submit_update(created.id, &edit).unwrap();

    assert_eq!(updated.parts.len(), 2);
    assert_eq!(updated.notes.as_deref(), Some("client fidel"));
    assert_eq!(updated.total_price(), Decimal::new(160, 0));
}

#[test]
fn add_part_dialog_validates_then_appends() {
    let conn = open_db_in_memory().unwrap();
    let service = RecordService::new(SqliteRecordStore::try_new(&conn).unwrap(), ReportConfig::default());
    let created = service
        .submit_create(&form("VIN-DIALOG", "Ana", ("Filtru", "F-1", "10")))
        .unwrap();

    let err = service.add_part(created.id, "", "", "0").unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Validation(ValidationError::MissingPartName { position: 1 })
    ));

    let updated = service.add_part(created.id, "Bujie", "NGK", "1e1").unwrap();
    assert_eq!(updated.parts[1].price, Some(Decimal::new(10, 0)));

    let after_remove = service.remove_part(created.id, 0).unwrap();
    assert_eq!(after_remove.parts.len(), 1);
    assert_eq!(after_remove.parts[0].name, "Bujie");
}

#[test]
fn failed_update_can_be_resynchronised_with_refresh() {
    let conn = open_db_in_memory().unwrap();
    let service = RecordService::new(SqliteRecordStore::try_new(&conn).unwrap(), ReportConfig::default());
    let first = service
        .submit_create(&form("VIN-R1", "Ana", ("Filtru", "F-1", "10")))
        .unwrap();
    let second = service
        .submit_create(&form("VIN-R2", "Dan", ("Filtru", "F-2", "20")))
        .unwrap();

    let mut clash = RecordForm::from_record(&second);
    clash.vin_number = first.vin_number.clone();
    clash.client_name = "Dan Pop".to_string();
    let err = service.submit_update(second.id, &clash).unwrap_err();
    assert!(matches!(err, SubmitError::Repo(RepoError::DuplicateVin(_))));

    match service.refresh(second.id).unwrap() {
        Lookup::Found(current) => assert_eq!(current.client_name, "Dan"),
        Lookup::NotFound => panic!("record should still exist"),
    }

    assert!(service.delete(second.id).unwrap());
    assert!(service.refresh(second.id).unwrap().is_not_found());
}
