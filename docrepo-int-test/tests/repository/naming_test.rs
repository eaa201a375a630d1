use crate::repository::{Broken, Contractor, Director, Employee, Invoice, Manager, Person, Product};
use docrepo::entity::{CollectionName, ConnectionName, Entity, EntityMetadata, ResolvedNames};
use docrepo::errors::ErrorKind;
use docrepo::repository::Repository;
use docrepo_int_test::test_util::{cleanup, create_test_context, run_test};

fn names<T: Entity>() -> (String, String) {
    let names = ResolvedNames::resolve::<T>(None).unwrap();
    (names.collection_name, names.connection_name)
}

#[test]
fn test_undeclared_types_use_lower_cased_name() {
    assert_eq!(names::<Person>(), ("person".to_string(), "person".to_string()));
    assert_eq!(names::<Product>(), ("product".to_string(), "product".to_string()));
}

#[test]
fn test_declared_names_are_lower_cased() {
    assert_eq!(names::<Invoice>(), ("invoices".to_string(), "billing".to_string()));
}

#[test]
fn test_base_subclass_uses_own_name() {
    assert_eq!(names::<Employee>(), ("employee".to_string(), "employee".to_string()));
}

#[test]
fn test_derived_connection_walks_to_base_subclass() {
    assert_eq!(names::<Manager>(), ("manager".to_string(), "employee".to_string()));
    assert_eq!(names::<Director>(), ("director".to_string(), "employee".to_string()));
}

#[test]
fn test_derived_declaration_wins_over_ancestor() {
    assert_eq!(names::<Contractor>(), ("contractor".to_string(), "vendors".to_string()));
}

#[test]
fn test_overrides_win() {
    let overrides = EntityMetadata::new()
        .collection_name(CollectionName::new("Archived_Invoices").unwrap())
        .connection_name(ConnectionName::new("Cold").unwrap());
    let names = ResolvedNames::resolve::<Invoice>(Some(&overrides)).unwrap();
    assert_eq!(names.collection_name, "archived_invoices");
    assert_eq!(names.connection_name, "cold");

    let partial = EntityMetadata::new().collection_name(CollectionName::new("Staff").unwrap());
    let names = ResolvedNames::resolve::<Manager>(Some(&partial)).unwrap();
    assert_eq!(names.collection_name, "staff");
    assert_eq!(names.connection_name, "employee");
}

#[test]
fn test_blank_declaration_is_rejected() {
    let err = ResolvedNames::resolve::<Broken>(None).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ValidationError);

    let err = CollectionName::new("").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ValidationError);
    let err = ConnectionName::new(" \t").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ValidationError);
}

#[test]
fn test_repository_binds_resolved_names() {
    run_test(
        create_test_context,
        |ctx| {
            let config = ctx.config(&["employee", "billing"]);

            let managers: Repository<Manager> = Repository::new(ctx.driver(), &config)?;
            assert_eq!(managers.collection_name(), "manager");
            assert_eq!(managers.connection_name(), "employee");
            assert_eq!(managers.collection().name(), "manager");

            let invoices: Repository<Invoice> = Repository::new(ctx.driver(), &config)?;
            assert_eq!(invoices.collection_name(), "invoices");

            let err = Repository::<Broken>::new(ctx.driver(), &config).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_explicit_collection_name_bypasses_resolution() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> =
                Repository::with_collection_name(ctx.driver(), ctx.connection_string(), "People_V2")?;
            assert_eq!(repo.collection_name(), "People_V2");
            assert_eq!(repo.connection_name(), "person");
            Ok(())
        },
        cleanup,
    )
}
