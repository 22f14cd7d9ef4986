//! Snapshot (Iceberg) loading tests.
//!
//! # Invariants Tested
//!
//! 1. The manifest alone defines the live file set; no filesystem walk
//! 2. Refresh against prior descriptors is incremental, including partial
//!    prior state
//! 3. Content type, partition id, and sequence number are re-attached from
//!    the manifest even on reuse
//! 4. Location containment is enforced when required and relaxed when not
//! 5. The partition set is rebuilt each load and versioned by content

use std::sync::Arc;

use strata_core::{
    Error, HostIndex, IcebergContentType, IcebergFileDescriptor, IcebergPartition,
    IcebergPartitionSet, LoadConfig, MemoryStorage, NetworkAddress, StorageClient,
};
use strata_filemeta::{ContentFile, GroupedContentFiles, IcebergFileMetadataLoader};

const TABLE: &str = "mem://nn:20500/warehouse/ice_t";

/// Creates one content file both in storage and in the manifest model.
fn content_file(
    storage: &MemoryStorage,
    path: &str,
    size: u64,
    mtime: i64,
    partition_id: u32,
    sequence_number: i64,
) -> ContentFile {
    storage
        .create_file_on_hosts(path, size, mtime, vec![NetworkAddress::new("dn1", 9866)])
        .unwrap();
    ContentFile {
        file_path: path.to_string(),
        file_size: size,
        modification_time: mtime,
        partition_id,
        sequence_number,
    }
}

/// A snapshot with six data files (two carrying deletes), one position
/// delete, and one equality delete: ten content files over two partitions.
fn populate_snapshot(storage: &MemoryStorage) -> (GroupedContentFiles, Vec<IcebergPartition>) {
    let mut grouped = GroupedContentFiles::default();
    for i in 0..6u32 {
        let partition = i % 2;
        grouped.data_files_without_deletes.push(content_file(
            storage,
            &format!("{TABLE}/data/event=p{partition}/{i:05}-data.parquet"),
            100 + u64::from(i),
            10 + i64::from(i),
            partition,
            1,
        ));
    }
    for i in 6..8u32 {
        grouped.data_files_with_deletes.push(content_file(
            storage,
            &format!("{TABLE}/data/event=p0/{i:05}-data.parquet"),
            100 + u64::from(i),
            10 + i64::from(i),
            0,
            1,
        ));
    }
    grouped.position_delete_files.push(content_file(
        storage,
        &format!("{TABLE}/data/event=p0/00008-pos-delete.parquet"),
        40,
        18,
        0,
        2,
    ));
    grouped.equality_delete_files.push(content_file(
        storage,
        &format!("{TABLE}/data/event=p1/00009-eq-delete.parquet"),
        41,
        19,
        1,
        2,
    ));

    let partitions = vec![
        IcebergPartition { id: 0, values: vec!["p0".to_string()] },
        IcebergPartition { id: 1, values: vec!["p1".to_string()] },
    ];
    (grouped, partitions)
}

fn loader(
    storage: &Arc<MemoryStorage>,
    config: LoadConfig,
    content: GroupedContentFiles,
    partitions: Vec<IcebergPartition>,
    old: &[IcebergFileDescriptor],
    old_partitions: Option<IcebergPartitionSet>,
) -> IcebergFileMetadataLoader {
    IcebergFileMetadataLoader::new(
        Arc::clone(storage) as Arc<dyn StorageClient>,
        Arc::new(HostIndex::new()),
        config,
        TABLE,
        content,
        partitions,
        old,
        old_partitions,
    )
}

#[tokio::test]
async fn initial_load_builds_all_groups() {
    let storage = Arc::new(MemoryStorage::new());
    let (content, partitions) = populate_snapshot(&storage);

    let result = loader(&storage, LoadConfig::default(), content, partitions, &[], None)
        .load()
        .await
        .unwrap();

    assert_eq!(result.stats.loaded_files, 10);
    assert_eq!(result.stats.skipped_files, 0);
    assert_eq!(result.descriptors.len(), 10);

    let count = |ct: IcebergContentType| result.descriptors.iter().filter(|fd| fd.content() == ct).count();
    assert_eq!(count(IcebergContentType::Data), 8);
    assert_eq!(count(IcebergContentType::PositionDelete), 1);
    assert_eq!(count(IcebergContentType::EqualityDelete), 1);

    assert_eq!(result.partitions.version(), 0);
    assert_eq!(result.partitions.len(), 2);
    assert!(result
        .descriptors
        .iter()
        .all(|fd| fd.file().relative_path().starts_with("data/")));
}

#[tokio::test]
async fn refresh_with_full_prior_state_is_all_skips() {
    let storage = Arc::new(MemoryStorage::new());
    let (content, partitions) = populate_snapshot(&storage);

    let first = loader(&storage, LoadConfig::default(), content.clone(), partitions.clone(), &[], None)
        .load()
        .await
        .unwrap();
    let refresh = loader(
        &storage,
        LoadConfig::default(),
        content,
        partitions,
        &first.descriptors,
        Some(first.partitions.clone()),
    )
    .load()
    .await
    .unwrap();

    assert_eq!(refresh.stats.loaded_files, 0);
    assert_eq!(refresh.stats.skipped_files, 10);
    assert_eq!(refresh.descriptors.len(), 10);
    assert_eq!(refresh.partitions.version(), first.partitions.version());
}

#[tokio::test]
async fn partial_prior_state_reloads_only_the_missing_half() {
    let storage = Arc::new(MemoryStorage::new());
    let (content, partitions) = populate_snapshot(&storage);

    let first = loader(&storage, LoadConfig::default(), content.clone(), partitions.clone(), &[], None)
        .load()
        .await
        .unwrap();
    let refresh = loader(
        &storage,
        LoadConfig::default(),
        content,
        partitions,
        &first.descriptors[0..5],
        Some(first.partitions.clone()),
    )
    .load()
    .await
    .unwrap();

    assert_eq!(refresh.stats.loaded_files, 5);
    assert_eq!(refresh.stats.skipped_files, 5);
    assert_eq!(refresh.descriptors.len(), 10);
}

#[tokio::test]
async fn file_removed_from_manifest_disappears_without_a_walk() {
    let storage = Arc::new(MemoryStorage::new());
    let (mut content, partitions) = populate_snapshot(&storage);

    let first = loader(&storage, LoadConfig::default(), content.clone(), partitions.clone(), &[], None)
        .load()
        .await
        .unwrap();

    // Compaction removed one data file from the manifest; storage still
    // holds the physical file.
    content.data_files_without_deletes.pop();
    let refresh = loader(
        &storage,
        LoadConfig::default(),
        content,
        partitions,
        &first.descriptors,
        Some(first.partitions.clone()),
    )
    .load()
    .await
    .unwrap();

    assert_eq!(refresh.descriptors.len(), 9);
    assert_eq!(refresh.stats.loaded_files, 0);
    assert_eq!(refresh.stats.skipped_files, 9);
}

#[tokio::test]
async fn manifest_metadata_is_reattached_on_reuse() {
    let storage = Arc::new(MemoryStorage::new());
    let (mut content, partitions) = populate_snapshot(&storage);

    let first = loader(&storage, LoadConfig::default(), content.clone(), partitions.clone(), &[], None)
        .load()
        .await
        .unwrap();

    // The manifest reassigns the sequence number of an unchanged file.
    content.data_files_without_deletes[0].sequence_number = 7;
    let target_path = content.data_files_without_deletes[0].file_path.clone();

    let refresh = loader(
        &storage,
        LoadConfig::default(),
        content,
        partitions,
        &first.descriptors,
        Some(first.partitions.clone()),
    )
    .load()
    .await
    .unwrap();

    assert_eq!(refresh.stats.loaded_files, 0);
    assert_eq!(refresh.stats.skipped_files, 10);
    let fd = refresh
        .descriptors
        .iter()
        .find(|fd| fd.file().absolute_path() == target_path)
        .unwrap();
    assert_eq!(fd.sequence_number(), 7);
}

#[tokio::test]
async fn partition_set_version_advances_when_partitions_change() {
    let storage = Arc::new(MemoryStorage::new());
    let (content, mut partitions) = populate_snapshot(&storage);

    let first = loader(&storage, LoadConfig::default(), content.clone(), partitions.clone(), &[], None)
        .load()
        .await
        .unwrap();

    partitions.push(IcebergPartition { id: 2, values: vec!["p2".to_string()] });
    let refresh = loader(
        &storage,
        LoadConfig::default(),
        content,
        partitions,
        &first.descriptors,
        Some(first.partitions.clone()),
    )
    .load()
    .await
    .unwrap();

    assert_eq!(refresh.partitions.version(), first.partitions.version() + 1);
    assert_eq!(refresh.partitions.len(), 3);
}

#[tokio::test]
async fn external_file_fails_when_containment_is_required() {
    let storage = Arc::new(MemoryStorage::new());
    let (mut content, partitions) = populate_snapshot(&storage);
    content.data_files_without_deletes.push(content_file(
        &storage,
        "mem://nn:20500/ext-warehouse/ice_t_ext/00099-data.parquet",
        55,
        30,
        0,
        3,
    ));

    let err = loader(&storage, LoadConfig::default(), content, partitions, &[], None)
        .load()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::LocationViolation { .. }));
}

#[tokio::test]
async fn external_file_loads_when_containment_is_relaxed() {
    let storage = Arc::new(MemoryStorage::new());
    let (mut content, partitions) = populate_snapshot(&storage);
    content.data_files_without_deletes.push(content_file(
        &storage,
        "mem://nn:20500/ext-warehouse/ice_t_ext/00099-data.parquet",
        55,
        30,
        0,
        3,
    ));

    let config = LoadConfig {
        data_files_in_table_location_only: false,
        ..LoadConfig::default()
    };

    let first = loader(&storage, config.clone(), content.clone(), partitions.clone(), &[], None)
        .load()
        .await
        .unwrap();
    assert_eq!(first.stats.loaded_files, 11);

    // Partial refresh across storage locations stays incremental.
    let refresh = loader(
        &storage,
        config,
        content,
        partitions,
        &first.descriptors[0..1],
        Some(first.partitions.clone()),
    )
    .load()
    .await
    .unwrap();
    assert_eq!(refresh.stats.loaded_files, 10);
    assert_eq!(refresh.stats.skipped_files, 1);
    assert_eq!(refresh.descriptors.len(), 11);
}

#[tokio::test]
async fn external_files_with_equal_paths_on_different_filesystems_stay_distinct() {
    let storage = Arc::new(MemoryStorage::new());
    let (mut content, partitions) = populate_snapshot(&storage);

    // Same path and identical size/mtime, hosted on two filesystems.
    for authority in ["fs-a", "fs-b"] {
        content.data_files_without_deletes.push(content_file(
            &storage,
            &format!("mem://{authority}/shared/00099-data.parquet"),
            55,
            30,
            0,
            3,
        ));
    }

    let config = LoadConfig {
        data_files_in_table_location_only: false,
        ..LoadConfig::default()
    };

    let first = loader(&storage, config.clone(), content.clone(), partitions.clone(), &[], None)
        .load()
        .await
        .unwrap();
    assert_eq!(first.stats.loaded_files, 12);
    assert_eq!(first.descriptors.len(), 12);

    let mut external: Vec<&str> = first
        .descriptors
        .iter()
        .map(|fd| fd.file().relative_path())
        .filter(|rel| rel.ends_with("00099-data.parquet"))
        .collect();
    external.sort_unstable();
    assert_eq!(
        external,
        vec!["fs-a/shared/00099-data.parquet", "fs-b/shared/00099-data.parquet"]
    );

    // Prior state holding only the fs-a copy must not satisfy the fs-b one.
    let prior: Vec<_> = first
        .descriptors
        .iter()
        .filter(|fd| fd.file().absolute_path().starts_with("mem://fs-a/"))
        .cloned()
        .collect();
    let refresh = loader(
        &storage,
        config,
        content,
        partitions,
        &prior,
        Some(first.partitions.clone()),
    )
    .load()
    .await
    .unwrap();
    assert_eq!(refresh.stats.skipped_files, 1);
    assert_eq!(refresh.stats.loaded_files, 11);
    let fs_b = refresh
        .descriptors
        .iter()
        .find(|fd| fd.file().relative_path() == "fs-b/shared/00099-data.parquet")
        .unwrap();
    assert_eq!(fs_b.file().absolute_path(), "mem://fs-b/shared/00099-data.parquet");
}
