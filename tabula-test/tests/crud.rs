use tabula_core::request::Request;
use tabula_core::{
    ColumnValueMap, CrudConfig, CrudEngine, CrudError, Criteria, Filter, MappingError, OrderBy,
    Params, QueryError, Value,
};
use tabula_macros::Entity;
use tabula_test::RecordingExecutor;

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[entity(table = "users")]
struct User {
    #[id]
    id: i64,
    name: Option<String>,
    email: Option<String>,
    age: Option<i32>,
}

#[derive(Entity, Debug, Default)]
struct AuditLog {
    message: String,
}

#[derive(Entity, Default)]
struct TwoKeys {
    #[id]
    a: i64,
    #[id]
    b: i64,
}

#[derive(Entity, Debug, Default)]
#[entity(table = "drafts")]
struct Draft {
    #[id]
    id: Option<i64>,
    title: Option<String>,
}

fn alice() -> User {
    User {
        id: 1,
        name: Some("alice".into()),
        email: None,
        age: Some(30),
    }
}

fn bob() -> User {
    User {
        id: 2,
        name: None,
        email: Some("bob@example.com".into()),
        age: None,
    }
}

fn engine() -> CrudEngine<RecordingExecutor> {
    CrudEngine::new(RecordingExecutor::new())
}

#[test]
fn test_select_by_key_found() {
    let crud = engine();
    crud.executor().push_row(Some(
        ColumnValueMap::new()
            .with("id", 1)
            .with("name", "alice")
            .with("email", Value::Null)
            .with("age", 30),
    ));

    let user = crud.select_by_key::<User>(1).unwrap();
    assert_eq!(user, Some(alice()));

    match crud.executor().last_request().unwrap() {
        Request::SelectByKey(req) => {
            assert_eq!(req.table_name, "users");
            assert_eq!(req.primary_key, "id");
            assert_eq!(req.key_value, Value::Int(1));
            assert_eq!(req.select_columns, vec!["id", "name", "email", "age"]);
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn test_select_by_key_not_found() {
    let crud = engine();
    assert_eq!(crud.select_by_key::<User>(99).unwrap(), None);
}

#[test]
fn test_null_key_fails_before_executor() {
    let crud = engine();
    let err = crud.select_by_key::<User>(None::<i64>).unwrap_err();
    assert!(matches!(err, CrudError::Mapping(MappingError::NullKey { .. })));
    let err = crud.delete_by_key::<User>(Value::Null).unwrap_err();
    assert!(err.is_mapping());
    assert_eq!(crud.executor().call_count(), 0);
}

#[test]
fn test_insert_sends_every_column() {
    let crud = engine();
    assert_eq!(crud.insert(&alice()).unwrap(), 1);
    match crud.executor().last_request().unwrap() {
        Request::InsertOne(req) => {
            assert_eq!(req.table_name, "users");
            assert_eq!(
                req.values.columns().collect::<Vec<_>>(),
                vec!["id", "name", "email", "age"]
            );
            assert_eq!(req.values.get("email"), Some(&Value::Null));
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn test_insert_selective_skips_nulls() {
    let crud = engine();
    crud.insert_selective(&alice()).unwrap();
    match crud.executor().last_request().unwrap() {
        Request::InsertOne(req) => {
            assert_eq!(req.values.columns().collect::<Vec<_>>(), vec!["id", "name", "age"]);
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn test_insert_batch_empty_is_noop() {
    let crud = engine();
    assert_eq!(crud.insert_batch::<User>(&[]).unwrap(), 0);
    assert_eq!(crud.executor().call_count(), 0);
}

#[test]
fn test_insert_batch_aligns_rows() {
    let crud = engine();
    assert_eq!(crud.insert_batch(&[alice(), bob()]).unwrap(), 2);
    assert_eq!(crud.executor().call_count(), 1);

    match crud.executor().last_request().unwrap() {
        Request::InsertMany(req) => {
            assert_eq!(req.column_names, vec!["id", "name", "email", "age"]);
            assert_eq!(req.rows.len(), 2);
            assert!(req.rows.iter().all(|row| row.len() == req.column_names.len()));
            assert_eq!(
                req.rows[0],
                vec![Value::Int(1), Value::from("alice"), Value::Null, Value::Int(30)]
            );
            assert_eq!(
                req.rows[1],
                vec![Value::Int(2), Value::Null, Value::from("bob@example.com"), Value::Null]
            );
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn test_update_by_key_overwrites_nulls() {
    let crud = engine();
    crud.update_by_key(&bob()).unwrap();
    match crud.executor().last_request().unwrap() {
        Request::UpdateByKey(req) => {
            assert_eq!(req.primary_key, "id");
            assert_eq!(req.key_value, Value::Int(2));
            assert_eq!(req.values.columns().collect::<Vec<_>>(), vec!["name", "email", "age"]);
            assert_eq!(req.values.get("name"), Some(&Value::Null));
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn test_update_by_key_selective() {
    let crud = engine();
    crud.update_by_key_selective(&bob()).unwrap();
    match crud.executor().last_request().unwrap() {
        Request::UpdateByKey(req) => {
            assert_eq!(req.values.columns().collect::<Vec<_>>(), vec!["email"]);
            assert!(!req.values.contains("id"));
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn test_update_selective_with_nothing_to_set() {
    let crud = engine();
    let err = crud
        .update_by_key_selective(&User {
            id: 4,
            ..User::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        CrudError::InvalidQuery(QueryError::EmptyAssignment { .. })
    ));
    assert_eq!(crud.executor().call_count(), 0);
}

#[test]
fn test_update_with_unset_key_is_rejected() {
    let crud = engine();
    let draft = Draft {
        id: None,
        title: Some("untitled".into()),
    };
    for err in [
        crud.update_by_key(&draft).unwrap_err(),
        crud.update_by_key_selective(&draft).unwrap_err(),
    ] {
        match err {
            CrudError::Mapping(MappingError::NullKey { entity, column }) => {
                assert_eq!(entity, "Draft");
                assert_eq!(column, "id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(crud.executor().call_count(), 0);
}

#[test]
fn test_delete_by_key() {
    let crud = engine();
    crud.executor().push_affected(1);
    assert_eq!(crud.delete_by_key::<User>(5).unwrap(), 1);
    match crud.executor().last_request().unwrap() {
        Request::DeleteByKey(req) => {
            assert_eq!(req.table_name, "users");
            assert_eq!(req.key_value, Value::Int(5));
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn test_delete_by_condition_passes_through() {
    let crud = engine();
    let mut params = Params::new();
    params.insert("min".into(), Value::Int(18));
    crud.executor().push_affected(3);
    assert_eq!(
        crud.delete_by_condition::<User>("age < :min", params.clone())
            .unwrap(),
        3
    );
    match crud.executor().last_request().unwrap() {
        Request::DeleteByCondition(req) => {
            assert_eq!(req.condition, "age < :min");
            assert_eq!(req.params, params);
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn test_update_by_condition() {
    let crud = engine();
    let (condition, params) = crud.filter().eq("name", "alice").render().unwrap();
    let values = ColumnValueMap::new().with("age", 31);
    crud.update_by_condition::<User>(values.clone(), condition, params)
        .unwrap();
    match crud.executor().last_request().unwrap() {
        Request::UpdateByCondition(req) => {
            assert_eq!(req.values, values);
            assert_eq!(req.condition, "name = :p0");
            assert_eq!(req.params.get("p0"), Some(&Value::from("alice")));
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn test_update_by_condition_validates_values() {
    let crud = engine();
    let err = crud
        .update_by_condition::<User>(ColumnValueMap::new(), "1 = 1", Params::new())
        .unwrap_err();
    assert!(err.is_invalid_query());

    let err = crud
        .update_by_condition::<User>(
            ColumnValueMap::new().with("nickname", "x"),
            "1 = 1",
            Params::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CrudError::Mapping(MappingError::UnknownColumn { column, .. }) if column == "nickname"
    ));
    assert_eq!(crud.executor().call_count(), 0);
}

#[test]
fn test_select_advanced_builds_query() {
    let crud = engine();
    let criteria = Criteria::new()
        .columns(["name"])
        .filter(Filter::new().gt("age", 20))
        .unwrap()
        .order_by(OrderBy::new().desc("age"))
        .unwrap()
        .page(2, 10);
    crud.executor().push_rows(vec![ColumnValueMap::new()
        .with("id", 1)
        .with("name", "alice")
        .with("age", 30)]);

    let users = crud.select_advanced::<User>(criteria).unwrap();
    assert_eq!(users, vec![alice()]);

    match crud.executor().last_request().unwrap() {
        Request::SelectAdvanced(req) => {
            let query = req.query;
            assert_eq!(query.table_name, "users");
            assert_eq!(query.select_columns, vec!["id", "name", "email", "age"]);
            assert_eq!(query.filter_expression.as_deref(), Some("age > :p0"));
            assert_eq!(query.filter_parameters.get("p0"), Some(&Value::Int(20)));
            assert_eq!(query.order_expression.as_deref(), Some("age DESC"));
            let page = query.pagination.unwrap();
            assert_eq!((page.limit, page.offset), (10, 10));
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn test_select_advanced_empty_result() {
    let crud = engine();
    let users = crud.select_advanced::<User>(Criteria::new()).unwrap();
    assert!(users.is_empty());
    match crud.executor().last_request().unwrap() {
        Request::SelectAdvanced(req) => assert!(req.pagination().is_none()),
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn test_select_advanced_by_column() {
    let crud = engine();
    crud.executor()
        .push_rows(vec![ColumnValueMap::new().with("email", "bob@example.com")]);
    let rows = crud
        .select_advanced_by_column::<User>(Criteria::new().columns(["email"]))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("email"), Some(&Value::from("bob@example.com")));
    match crud.executor().last_request().unwrap() {
        Request::SelectAdvanced(req) => assert_eq!(req.query.select_columns, vec!["email"]),
        other => panic!("unexpected request: {other:?}"),
    }

    let err = crud
        .select_advanced_by_column::<User>(Criteria::new().columns(["password"]))
        .unwrap_err();
    assert!(err.is_mapping());
}

#[test]
fn test_select_advanced_by_column_needs_columns() {
    let crud = engine();
    let err = crud
        .select_advanced_by_column::<User>(Criteria::new().columns(Vec::<String>::new()))
        .unwrap_err();
    assert!(matches!(
        err,
        CrudError::InvalidQuery(QueryError::EmptySelection { ref table }) if table == "users"
    ));
    assert_eq!(crud.executor().call_count(), 0);
}

#[test]
fn test_partial_pagination_is_rejected() {
    let crud = engine();
    let mut criteria = Criteria::new();
    criteria.page_no = Some(2);
    let err = crud.select_advanced::<User>(criteria).unwrap_err();
    assert!(matches!(
        err,
        CrudError::InvalidQuery(QueryError::PartialPagination { .. })
    ));

    let mut criteria = Criteria::new();
    criteria.page_size = Some(10);
    assert!(crud.select_advanced::<User>(criteria).unwrap_err().is_invalid_query());
    assert_eq!(crud.executor().call_count(), 0);
}

#[test]
fn test_max_page_size() {
    let config = CrudConfig {
        max_page_size: Some(50),
        ..CrudConfig::default()
    };
    let crud = CrudEngine::with_config(RecordingExecutor::new(), config);
    let err = crud
        .select_advanced::<User>(Criteria::new().page(1, 51))
        .unwrap_err();
    assert!(matches!(
        err,
        CrudError::InvalidQuery(QueryError::PageSizeTooLarge { page_size: 51, max: 50 })
    ));
    assert!(crud.select_advanced::<User>(Criteria::new().page(1, 50)).is_ok());
}

#[test]
fn test_executor_error_passthrough() {
    let crud = engine();
    crud.executor().fail_next("connection reset");
    let err = crud.insert(&alice()).unwrap_err();
    match err {
        CrudError::Executor(inner) => assert_eq!(inner.message(), "connection reset"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(crud.executor().call_count(), 1);
}

#[test]
fn test_key_operations_need_exactly_one_key() {
    let crud = engine();
    let err = crud.select_by_key::<AuditLog>(1).unwrap_err();
    assert!(matches!(
        err,
        CrudError::Mapping(MappingError::MissingKey { .. })
    ));
    assert!(crud.delete_by_key::<TwoKeys>(1).unwrap_err().is_mapping());
    assert!(crud.update_by_key(&TwoKeys::default()).unwrap_err().is_mapping());
    assert_eq!(crud.executor().call_count(), 0);

    // Key-less types still support everything that does not address a key.
    crud.insert(&AuditLog {
        message: "hello".into(),
    })
    .unwrap();
    assert_eq!(crud.executor().call_count(), 1);
}

#[test]
fn test_hash_param_style() {
    let config = CrudConfig {
        param_style: tabula_core::ParamStyle::Hash,
        ..CrudConfig::default()
    };
    let crud = CrudEngine::with_config(RecordingExecutor::new(), config);
    let (condition, _) = crud.filter().eq("id", 1).render().unwrap();
    assert_eq!(condition, "id = #{p0}");
}

#[test]
fn test_engine_over_shared_executor() {
    let executor = std::sync::Arc::new(RecordingExecutor::new());
    let crud = CrudEngine::new(executor.clone());
    crud.insert(&alice()).unwrap();
    let other = CrudEngine::new(&*executor);
    other.insert(&bob()).unwrap();
    assert_eq!(executor.call_count(), 2);
    let json = executor.requests_json();
    assert_eq!(json[0]["kind"], "insert_one");
    assert_eq!(json[1]["values"]["email"], "bob@example.com");
}
