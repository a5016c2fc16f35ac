use leadflow_core::{
    open_db_in_memory, resolve_lead, LeadIdentity, LeadMatch, LeadRepository, LeadResolution,
    ListQuery, SqliteLeadRepository, UnitOfWork,
};

#[test]
fn unknown_identity_creates_a_lead_with_all_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLeadRepository::try_new(&conn).unwrap();

    let identity = LeadIdentity::default()
        .with_external_id("crm-1")
        .with_phone("+15550001")
        .with_email("ada@example.com")
        .with_name("Ada");
    let resolution = resolve_lead(&repo, &identity).unwrap();

    let LeadResolution::Created { lead_id } = resolution else {
        panic!("expected a created lead, got {resolution:?}");
    };
    let lead = repo.get_lead(lead_id).unwrap().unwrap();
    assert_eq!(lead.external_id.as_deref(), Some("crm-1"));
    assert_eq!(lead.phone.as_deref(), Some("+15550001"));
    assert_eq!(lead.email.as_deref(), Some("ada@example.com"));
    assert_eq!(lead.name.as_deref(), Some("Ada"));
}

#[test]
fn external_id_match_wins_over_phone_match_on_another_lead() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLeadRepository::try_new(&conn).unwrap();

    let by_external = repo
        .insert_lead(&LeadIdentity::default().with_external_id("crm-7"))
        .unwrap();
    let by_phone = repo
        .insert_lead(&LeadIdentity::default().with_phone("+15550007"))
        .unwrap();
    assert_ne!(by_external, by_phone);

    let resolution = resolve_lead(
        &repo,
        &LeadIdentity::default()
            .with_external_id("crm-7")
            .with_phone("+15550007"),
    )
    .unwrap();

    assert_eq!(
        resolution,
        LeadResolution::Matched {
            lead_id: by_external,
            matched_by: LeadMatch::ExternalId,
        }
    );
}

#[test]
fn unmatched_external_id_falls_through_to_phone_then_email() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLeadRepository::try_new(&conn).unwrap();

    let phone_lead = repo
        .insert_lead(&LeadIdentity::default().with_phone("+15550100"))
        .unwrap();
    let email_lead = repo
        .insert_lead(&LeadIdentity::default().with_email("grace@example.com"))
        .unwrap();

    let via_phone = resolve_lead(
        &repo,
        &LeadIdentity::default()
            .with_external_id("crm-unknown")
            .with_phone("+15550100")
            .with_email("grace@example.com"),
    )
    .unwrap();
    assert_eq!(
        via_phone,
        LeadResolution::Matched {
            lead_id: phone_lead,
            matched_by: LeadMatch::Phone,
        }
    );

    let via_email = resolve_lead(
        &repo,
        &LeadIdentity::default()
            .with_phone("+15559999")
            .with_email("grace@example.com"),
    )
    .unwrap();
    assert_eq!(
        via_email,
        LeadResolution::Matched {
            lead_id: email_lead,
            matched_by: LeadMatch::Email,
        }
    );
}

#[test]
fn repeated_phone_resolves_to_the_same_lead() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLeadRepository::try_new(&conn).unwrap();
    let identity = LeadIdentity::default().with_phone("+15550200");

    let first = resolve_lead(&repo, &identity).unwrap();
    let second = resolve_lead(&repo, &identity).unwrap();

    assert!(matches!(first, LeadResolution::Created { .. }));
    assert_eq!(second.lead_id(), first.lead_id());
    assert_eq!(repo.list_leads(&ListQuery::default()).unwrap().len(), 1);
}

#[test]
fn duplicate_phone_rows_resolve_to_oldest_lead() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLeadRepository::try_new(&conn).unwrap();

    let oldest = repo
        .insert_lead(&LeadIdentity::default().with_phone("+15550300"))
        .unwrap();
    repo.insert_lead(&LeadIdentity::default().with_phone("+15550300"))
        .unwrap();

    let resolution = resolve_lead(&repo, &LeadIdentity::default().with_phone("+15550300")).unwrap();
    assert_eq!(resolution.lead_id(), oldest);
}

#[test]
fn identity_without_keys_always_creates_a_new_lead() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLeadRepository::try_new(&conn).unwrap();
    let anonymous = LeadIdentity::default().with_name("walk-in");

    let first = resolve_lead(&repo, &anonymous).unwrap();
    let second = resolve_lead(&repo, &anonymous).unwrap();

    assert!(matches!(first, LeadResolution::Created { .. }));
    assert!(matches!(second, LeadResolution::Created { .. }));
    assert_ne!(first.lead_id(), second.lead_id());
}

#[test]
fn blank_keys_are_treated_as_absent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLeadRepository::try_new(&conn).unwrap();

    let blank = LeadIdentity::default()
        .with_external_id("")
        .with_phone("   ")
        .with_email("");
    let first = resolve_lead(&repo, &blank).unwrap();
    let second = resolve_lead(&repo, &blank).unwrap();
    assert_ne!(first.lead_id(), second.lead_id());

    let stored = repo.get_lead(first.lead_id()).unwrap().unwrap();
    assert_eq!(stored.external_id, None);
    assert_eq!(stored.phone, None);
    assert_eq!(stored.email, None);
}

#[test]
fn lead_created_inside_rolled_back_unit_of_work_is_discarded() {
    let mut conn = open_db_in_memory().unwrap();

    {
        let uow = UnitOfWork::begin(&mut conn).unwrap();
        let repo = SqliteLeadRepository::try_new(uow.connection()).unwrap();
        let resolution =
            resolve_lead(&repo, &LeadIdentity::default().with_phone("+15550400")).unwrap();
        assert!(repo.get_lead(resolution.lead_id()).unwrap().is_some());
        drop(repo);
        uow.rollback().unwrap();
    }

    let repo = SqliteLeadRepository::try_new(&conn).unwrap();
    assert!(repo.find_by_phone("+15550400").unwrap().is_none());
}
