//! End-to-end generation tests: table definitions in, artifacts and sample
//! SQL out.

use daoforge::{
    Column, DirtyTracking, GenerationError, Generator, GeneratorConfig, HostType, Index, ReturnShape,
    StatementError, Table, TableDefinition, TableId,
};

fn user_basic() -> Table {
    let definition: TableDefinition = serde_json::from_str(
        r#"{
            "schema": "foundation",
            "name": "user_basic",
            "columns": [
                {"name": "id", "type": "bigint(20) unsigned", "auto_increment": true},
                {"name": "username", "type": "varchar(32)", "length": 32},
                {"name": "nickname", "type": "varchar(32)", "nullable": true},
                {"name": "status", "type": "tinyint(4)", "comment": "enum.ACTIVE(1-active)||LOCKED(2-locked)"},
                {"name": "create_time", "type": "datetime"}
            ],
            "primary_key": ["id"],
            "indexes": [
                {"name": "idx_username", "type": "UNIQUE", "columns": ["username"]},
                {"name": "idx_nickname", "type": "KEY", "columns": ["nickname"]}
            ]
        }"#,
    )
    .unwrap();
    Table::try_from(definition).unwrap()
}

fn broken_table() -> Table {
    Table::new(
        TableId::new("", "shape"),
        vec![Column::new("id", "int", 1), Column::new("outline", "polygon", 2)],
        vec!["id".to_string()],
        Vec::new(),
    )
    .unwrap()
}

fn tag() -> Table {
    Table::new(
        TableId::new("", "tag"),
        vec![Column::new("id", "int", 1).auto_increment(), Column::new("label", "varchar(16)", 2)],
        vec!["id".to_string()],
        vec![Index::unique("uk_label", &["label"])],
    )
    .unwrap()
}

#[test]
fn test_user_basic_artifacts() {
    let generator = Generator::new(GeneratorConfig::default());
    let artifacts = generator.generate(&user_basic()).unwrap();

    assert_eq!(artifacts.record.type_name, "UserBasic");
    assert_eq!(artifacts.record.parameter_name, "userBasic");
    let fields: Vec<_> = artifacts.record.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["id", "username", "nickname", "status", "createTime"]);
    assert_eq!(artifacts.record.fields[0].host, HostType::U64);
    assert_eq!(artifacts.record.fields[4].dirty_flag.as_deref(), Some("createTimeIsSet"));

    assert_eq!(artifacts.operations.len(), 19);
    let select = artifacts
        .operations
        .iter()
        .find(|o| o.name == "selectByUsername")
        .unwrap();
    assert_eq!(select.returns(), ReturnShape::Record);
    assert!(!select.template.paging_enabled);

    assert_eq!(artifacts.enums.len(), 1);
    let status = &artifacts.enums[0];
    assert_eq!(status.type_name, "UserBasicStatusEnum");
    let names: Vec<_> = status.elements.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["ACTIVE", "LOCKED"]);
}

#[test]
fn test_preview_sql() {
    let generator = Generator::new(GeneratorConfig::default());
    let artifacts = generator.generate(&user_basic()).unwrap();
    let preview = artifacts.preview();
    let sql = |name: &str| -> String {
        preview
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, sql)| sql.clone().ok())
            .unwrap()
    };

    assert_eq!(
        sql("selectByPrimaryKeyForUpdate"),
        "SELECT id, username, nickname, status, create_time FROM `foundation`.`user_basic` \
         WHERE (id=#{id}) FOR UPDATE"
    );
    assert_eq!(
        sql("updateByUsername"),
        "UPDATE `foundation`.`user_basic` SET nickname=#{userBasic.nickname}, \
         status=#{userBasic.status}, create_time=#{userBasic.createTime} WHERE (username=#{username})"
    );
    assert_eq!(
        sql("countByNickname"),
        "SELECT COUNT(*) FROM `foundation`.`user_basic` WHERE (nickname=#{nickname})"
    );
    assert_eq!(
        sql("selectByNickname"),
        "SELECT id, username, nickname, status, create_time FROM `foundation`.`user_basic` \
         WHERE (nickname=#{nickname}) ORDER BY id ASC LIMIT #{offset},#{rowCount}"
    );
    assert_eq!(
        sql("batchInsertUseGeneratedKeys"),
        "INSERT INTO `foundation`.`user_basic` (username, nickname, status, create_time) VALUES \
         (#{list[0].username}, #{list[0].nickname}, #{list[0].status}, #{list[0].createTime}), \
         (#{list[1].username}, #{list[1].nickname}, #{list[1].status}, #{list[1].createTime})"
    );
    assert_eq!(sql("countByExample"), "SELECT COUNT(*) FROM `foundation`.`user_basic`");
}

#[test]
fn test_partial_success() {
    let generator = Generator::new(GeneratorConfig::default());
    let report = generator.generate_all(vec![Ok(user_basic()), Ok(broken_table()), Ok(tag())]);

    assert!(!report.is_success());
    let generated: Vec<_> = report.artifacts.iter().map(|a| a.table.name().to_string()).collect();
    assert_eq!(generated, vec!["user_basic", "tag"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].table, "shape");
    assert!(matches!(
        report.failures[0].error,
        GenerationError::UnsupportedColumnType { ref column, .. } if column == "outline"
    ));
}

#[test]
fn test_all_or_nothing() {
    let config = GeneratorConfig {
        all_or_nothing: true,
        ..GeneratorConfig::default()
    };
    let report = Generator::new(config).generate_all(vec![Ok(user_basic()), Ok(broken_table()), Ok(tag())]);

    assert!(report.artifacts.is_empty());
    assert_eq!(report.failures.len(), 1);
}

#[test]
fn test_provider_failure_is_reported() {
    let unavailable = Table::new(TableId::new("", "ghost"), Vec::new(), Vec::new(), Vec::new());
    assert!(unavailable.is_err());

    let report = Generator::new(GeneratorConfig::default()).generate_all(vec![unavailable, Ok(tag())]);
    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(report.failures[0].table, "ghost");
    assert!(matches!(report.failures[0].error, GenerationError::TableUnavailable { .. }));
}

#[test]
fn test_custom_resolver_and_tracking() {
    let config = GeneratorConfig {
        dirty_tracking: DirtyTracking::Disabled,
        ..GeneratorConfig::default()
    };
    let generator = Generator::new(config).with_resolver(|expr: &str| match expr {
        "polygon" => Some(HostType::Bytes),
        "int" => Some(HostType::I32),
        _ => None,
    });
    let artifacts = generator.generate(&broken_table()).unwrap();
    assert_eq!(artifacts.record.fields[1].host, HostType::Bytes);
    assert!(artifacts.record.fields.iter().all(|f| f.dirty_flag.is_none()));
}

#[test]
fn test_update_with_only_key_assigned() {
    let generator = Generator::new(GeneratorConfig::default());
    let artifacts = generator.generate(&tag()).unwrap();
    let update = artifacts
        .operations
        .iter()
        .find(|o| o.name == "updateByPrimaryKey")
        .unwrap();

    let mut args = artifacts.meta().with_meta(daoforge::RenderArgs::sample);
    args.assigned = [0].into_iter().collect();
    let err = artifacts
        .meta()
        .with_meta(|meta| update.template.render(meta, &args))
        .unwrap_err();
    assert_eq!(err, StatementError::EmptyUpdate { table: "`tag`".to_string() });
}
