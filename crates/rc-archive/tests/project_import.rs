//! End-to-end export and import of project bundles

use std::sync::Arc;

use bytes::Bytes;
use rc_archive::{ArchiveError, ArchiveService, MemoryArchive, TarArchive};
use rc_attachments::{LocalStorage, MemoryStorage, PassthroughProcessor, Storage};
use rc_core::config::{ExportConfig, ImportConfig};
use rc_core::traits::{new_id, Id};
use rc_core::types::Source;
use rc_db::{
    FileRepository, FindingRepository, MemberRepository, MemoryStore, ProjectRepository,
    ProjectTypeRepository, SectionRepository,
};
use rc_models::{
    FieldDefinition, FieldType, FileKind, FindingTemplate, PentestFinding, PentestProject,
    ProjectMemberInfo, ProjectType, ReportSectionDefinition, UploadedFile, User,
};
use serde_json::{json, Value};

struct Fixture {
    store: Arc<MemoryStore>,
    storage: Arc<MemoryStorage>,
    service: ArchiveService<MemoryStore>,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let storage = Arc::new(MemoryStorage::new());
    let service = ArchiveService::new(
        store.clone(),
        storage.clone() as Arc<dyn Storage>,
        Arc::new(PassthroughProcessor),
        ImportConfig::default(),
        ExportConfig::default(),
    );
    Fixture { store, storage, service }
}

fn project_type_with_sections(sections: &[&str]) -> ProjectType {
    let mut project_type = ProjectType::new("Web Pentest", "en-US");
    project_type.report_fields.insert("title".into(), FieldDefinition::new(FieldType::String));
    project_type
        .report_fields
        .insert("scope".into(), FieldDefinition::new(FieldType::Markdown));
    project_type
        .finding_fields
        .insert("title".into(), FieldDefinition::new(FieldType::String));
    project_type.finding_field_order = vec!["title".into()];
    project_type.report_sections = sections
        .iter()
        .map(|id| ReportSectionDefinition::new(*id, vec![]))
        .collect();
    project_type
}

/// Raw `projects/v1` document with an embedded project type defining `sections`
fn project_document(old_id: Id, sections: &[&str]) -> Value {
    let report_sections: Vec<Value> = sections.iter().map(|id| json!({"id": id, "fields": []})).collect();
    json!({
        "format": "projects/v1",
        "id": old_id,
        "name": "Acme External",
        "language": "en-US",
        "project_type": {
            "format": "projecttypes/v1",
            "id": new_id(),
            "name": "Web Pentest",
            "language": "en-US",
            "report_fields": {"title": {"type": "string"}},
            "report_sections": report_sections,
            "finding_fields": {"title": {"type": "string"}},
            "finding_field_order": ["title"],
            "report_template": "",
            "report_styles": "",
            "report_preview_data": {},
            "assets": [],
        },
        "members": [],
        "report_data": {"title": "Report"},
        "sections": [],
        "findings": [],
        "images": [],
    })
}

fn archive_with(document: &Value) -> MemoryArchive {
    let mut archive = MemoryArchive::new();
    archive.insert_json(format!("{}.json", document["id"].as_str().unwrap_or("doc")), document);
    archive
}

#[tokio::test]
async fn test_project_round_trip() {
    let Fixture { store, storage, service } = fixture();

    let user = User::new("jdoe").with_name("Jane", "Doe");
    store.insert_user(user.clone());
    let mut template = FindingTemplate::new("en-US");
    template.update_data(json!({"title": "SQL Injection"}).as_object().cloned().unwrap());
    store.insert_template(template.clone());

    let project_type = store
        .create_project_type(project_type_with_sections(&["s1", "s2"]))
        .await
        .unwrap();
    let mut project = PentestProject::new("Acme External", "en-US", project_type.id);
    project.data = json!({"title": "Acme Report"}).as_object().cloned().unwrap();
    let project = store.create_project(project).await.unwrap();

    store
        .bulk_create_members(vec![ProjectMemberInfo::new(project.id, user.id, vec!["lead".into()])])
        .await
        .unwrap();

    let mut sections = store.sections_for_project(project.id).await.unwrap();
    sections[0].status = "finished".into();
    sections[0].assignee_id = Some(user.id);
    store.update_section(&sections[0]).await.unwrap();

    let mut finding = PentestFinding::new(project.id);
    finding.template_id = Some(template.id);
    finding.assignee_id = Some(user.id);
    finding.update_data(json!({"title": "SQLi in login"}).as_object().cloned().unwrap());
    store.bulk_create_findings(vec![finding.clone()]).await.unwrap();

    storage.put("uploadedassets/logo.png", Bytes::from_static(b"logo")).await.unwrap();
    storage.put("uploadedimages/shot.png", Bytes::from_static(b"shot")).await.unwrap();
    store
        .bulk_create_files(vec![
            UploadedFile::new(FileKind::Asset, project_type.id, "logo.png", "uploadedassets/logo.png", 4),
            UploadedFile::new(FileKind::Image, project.id, "shot.png", "uploadedimages/shot.png", 4),
        ])
        .await
        .unwrap();

    let bytes = service.export_projects_archive(&[project.id]).await.unwrap();
    let archive = TarArchive::from_reader(&bytes[..]).unwrap();

    let imported = service.import_projects(&archive).await.unwrap();
    assert_eq!(imported.len(), 1);
    let copy = &imported[0];

    assert_ne!(copy.id, project.id);
    assert_eq!(copy.name, project.name);
    assert_eq!(copy.language, project.language);
    assert_eq!(copy.source, Source::Imported);
    assert_eq!(Value::Object(copy.data.clone()), json!({"title": "Acme Report", "scope": null}));
    assert!(copy.imported_members.is_empty());

    let members = store.members_for_project(copy.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, user.id);
    assert_eq!(members[0].roles, vec!["lead".to_string()]);

    let copy_type = store.find_project_type(copy.project_type_id).await.unwrap().unwrap();
    assert_ne!(copy_type.id, project_type.id);
    assert_eq!(copy_type.source, Source::ImportedDependency);
    assert_eq!(copy_type.linked_project, Some(copy.id));
    assert_eq!(copy_type.report_fields, project_type.report_fields);
    assert_eq!(copy_type.finding_field_order, project_type.finding_field_order);

    let copy_sections = store.sections_for_project(copy.id).await.unwrap();
    assert_eq!(copy_sections.len(), 2);
    let s1 = copy_sections.iter().find(|s| s.section_id == "s1").unwrap();
    assert_eq!(s1.status, "finished");
    assert_eq!(s1.assignee_id, Some(user.id));

    let findings = store.findings_for_project(copy.id).await.unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].finding_id, finding.finding_id);
    assert_eq!(findings[0].template_id, Some(template.id));
    assert_eq!(findings[0].assignee_id, Some(user.id));
    assert_eq!(findings[0].data["title"], json!("SQLi in login"));

    let images = store.files_for(FileKind::Image, copy.id).await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(storage.get(&images[0].storage_key).await.unwrap(), Bytes::from_static(b"shot"));
    let assets = store.files_for(FileKind::Asset, copy_type.id).await.unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].name, "logo.png");
}

#[tokio::test]
async fn test_dangling_references_are_dropped() {
    let Fixture { store, service, .. } = fixture();

    let mut document = project_document(new_id(), &["s1"]);
    document["findings"] = json!([{
        "id": new_id(),
        "template": new_id(),
        "assignee": {"id": new_id()},
        "data": {"title": "XSS"},
    }]);

    let imported = service.import_projects(&archive_with(&document)).await.unwrap();
    let findings = store.findings_for_project(imported[0].id).await.unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].template_id, None);
    assert_eq!(findings[0].assignee_id, None);
}

#[tokio::test]
async fn test_unknown_member_becomes_detached_snapshot() {
    let Fixture { store, service, .. } = fixture();
    let known = User::new("known");
    store.insert_user(known.clone());

    let mut document = project_document(new_id(), &[]);
    document["members"] = json!([
        {"id": known.id, "roles": ["pentester"]},
        {
            "id": new_id(),
            "name": "Dr. Max Muster",
            "first_name": "Max",
            "last_name": "Muster",
            "email": "max@example.com",
            "roles": ["reviewer"],
            "department": "Red Team",
        },
        {"name": "No Id"},
    ]);

    let imported = service.import_projects(&archive_with(&document)).await.unwrap();
    let project = &imported[0];

    let members = store.members_for_project(project.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, known.id);

    assert_eq!(project.imported_members.len(), 2);
    let detached = &project.imported_members[0];
    assert_eq!(detached.name.as_deref(), Some("Dr. Max Muster"));
    assert_eq!(detached.email.as_deref(), Some("max@example.com"));
    assert_eq!(detached.roles, vec!["reviewer".to_string()]);
    assert_eq!(detached.extra["department"], json!("Red Team"));
    assert_eq!(project.imported_members[1].name.as_deref(), Some("No Id"));
}

#[tokio::test]
async fn test_pentesters_key_is_accepted() {
    let Fixture { store, service, .. } = fixture();
    let user = User::new("legacy");
    store.insert_user(user.clone());

    let mut document = project_document(new_id(), &[]);
    document.as_object_mut().unwrap().remove("members");
    document["pentesters"] = json!([{"id": user.id, "roles": ["pentester"]}]);

    let imported = service.import_projects(&archive_with(&document)).await.unwrap();
    let members = store.members_for_project(imported[0].id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, user.id);
}

#[tokio::test]
async fn test_only_matching_sections_are_updated() {
    let Fixture { store, service, .. } = fixture();

    let mut document = project_document(new_id(), &["s1", "s2"]);
    document["sections"] = json!([
        {"id": "s1", "status": "done"},
        {"id": "s3", "status": "done"},
    ]);

    let imported = service.import_projects(&archive_with(&document)).await.unwrap();
    let sections = store.sections_for_project(imported[0].id).await.unwrap();

    assert_eq!(sections.len(), 2);
    let s1 = sections.iter().find(|s| s.section_id == "s1").unwrap();
    let s2 = sections.iter().find(|s| s.section_id == "s2").unwrap();
    assert_eq!(s1.status, "done");
    assert_eq!(s2.status, "in-progress");
    assert!(sections.iter().all(|s| s.section_id != "s3"));
}

#[tokio::test]
async fn test_unsafe_file_names_are_rejected() {
    for name in ["../shot.png", "dir\\shot.png", "shot\0.png"] {
        let Fixture { store, storage, service } = fixture();

        let old_id = new_id();
        let mut document = project_document(old_id, &[]);
        document["images"] = json!([{"name": "ok.png"}, {"name": name}]);
        let mut archive = archive_with(&document);
        archive.insert(format!("{}-images/ok.png", old_id), Bytes::from_static(b"ok"));

        let err = service.import_projects(&archive).await.unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_error("images[1].name"), "{name:?}: {errors}");

        assert!(storage.is_empty().await);
        let state = store.snapshot();
        assert!(state.projects.is_empty());
        assert!(state.project_types.is_empty());
        assert!(state.files.is_empty());
    }
}

#[tokio::test]
async fn test_format_mismatch_names_both_tags() {
    let Fixture { service, .. } = fixture();

    let mut document = project_document(new_id(), &[]);
    document["format"] = json!("templates/v1");

    let err = service.import_projects(&archive_with(&document)).await.unwrap_err();
    let message = err.validation_errors().unwrap().to_string();
    assert!(message.contains("projects/v1"), "{message}");
    assert!(message.contains("templates/v1"), "{message}");
}

#[tokio::test]
async fn test_failed_import_rolls_back_and_removes_files() {
    let Fixture { store, storage, service } = fixture();

    let old_id = new_id();
    let mut document = project_document(old_id, &["s1"]);
    document["images"] = json!([{"name": "first.png"}, {"name": "missing.png"}]);
    let mut archive = archive_with(&document);
    archive.insert(format!("{}-images/first.png", old_id), Bytes::from_static(b"first"));

    let err = service.import_projects(&archive).await.unwrap_err();
    assert!(matches!(err, ArchiveError::MissingEntry(_)));

    assert!(storage.is_empty().await);
    let state = store.snapshot();
    assert!(state.projects.is_empty());
    assert!(state.project_types.is_empty());
    assert!(state.sections.is_empty());
    assert!(state.files.is_empty());
}

#[tokio::test]
async fn test_standalone_project_types_round_trip() {
    let Fixture { store, storage, service } = fixture();

    let project_type = store
        .create_project_type(project_type_with_sections(&["summary"]))
        .await
        .unwrap();
    storage.put("uploadedassets/logo.png", Bytes::from_static(b"logo")).await.unwrap();
    store
        .bulk_create_files(vec![UploadedFile::new(
            FileKind::Asset,
            project_type.id,
            "logo.png",
            "uploadedassets/logo.png",
            4,
        )])
        .await
        .unwrap();

    let mut archive = MemoryArchive::new();
    service.export_project_types(&[project_type.id], &mut archive).await.unwrap();
    assert!(archive.contains(&format!("{}-assets/logo.png", project_type.id)));

    let imported = service.import_project_types(&archive).await.unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].source, Source::Imported);
    assert_eq!(imported[0].linked_project, None);
    assert_eq!(store.files_for(FileKind::Asset, imported[0].id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_long_language_is_a_validation_error() {
    let Fixture { store, service, .. } = fixture();

    let mut document = project_document(new_id(), &[]);
    document["project_type"]["language"] = json!("en-Latn-US-abcdefgh");

    let err = service.import_projects(&archive_with(&document)).await.unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert!(errors.has_error("project_type.language"), "{errors}");
    assert!(store.snapshot().project_types.is_empty());
}

#[tokio::test]
async fn test_dotted_image_names_on_local_storage() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let service = ArchiveService::new(
        store.clone(),
        Arc::new(LocalStorage::new(dir.path())),
        Arc::new(PassthroughProcessor),
        ImportConfig::default(),
        ExportConfig::default(),
    );

    let old_id = new_id();
    let mut document = project_document(old_id, &[]);
    document["images"] = json!([{"name": "report..final.png"}]);
    let mut archive = archive_with(&document);
    archive.insert(format!("{}-images/report..final.png", old_id), Bytes::from_static(b"png"));

    let imported = service.import_projects(&archive).await.unwrap();
    let images = store.files_for(FileKind::Image, imported[0].id).await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].name, "report..final.png");
    assert!(dir.path().join(&images[0].storage_key).exists());
}
