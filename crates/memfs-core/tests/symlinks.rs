mod common;

use common::{read_string, setup};
use memfs_core::{FsConfig, FsError, Permissions, VirtualFs};

#[test]
fn test_read_and_write_through_symlink() {
    let fs = setup();
    fs.create("/target.txt", "old").unwrap();
    fs.symlink("/target.txt", "/link.txt").unwrap();
    assert_eq!(read_string(&fs, "/link.txt"), "old");

    fs.write("/link.txt", "new").unwrap();
    assert_eq!(read_string(&fs, "/target.txt"), "new");
    assert!(fs.is_file("/link.txt"));
    assert_eq!(fs.disk_usage(), 3);
}

#[test]
fn test_symlink_to_directory() {
    let fs = setup();
    fs.mkdir("/realdir").unwrap();
    fs.create("/realdir/file.txt", "data").unwrap();
    fs.symlink("/realdir", "/linkdir").unwrap();
    assert_eq!(read_string(&fs, "/linkdir/file.txt"), "data");
    assert!(fs.is_dir("/linkdir"));
    assert_eq!(fs.list("/linkdir").unwrap(), vec!["file.txt"]);

    fs.create("/linkdir/new.txt", "n").unwrap();
    assert!(fs.exists("/realdir/new.txt"));
}

#[test]
fn test_symlink_chain() {
    let fs = setup();
    fs.create("/file.txt", "data").unwrap();
    fs.symlink("/file.txt", "/link1.txt").unwrap();
    fs.symlink("/link1.txt", "/link2.txt").unwrap();
    assert_eq!(read_string(&fs, "/link2.txt"), "data");
}

#[test]
fn test_link_target_through_linked_directory() {
    let fs = setup();
    fs.mkdir("/real").unwrap();
    fs.create("/real/f", "data").unwrap();
    fs.symlink("/real", "/alias").unwrap();
    fs.symlink("/alias/f", "/l").unwrap();

    assert_eq!(read_string(&fs, "/l"), "data");
    assert!(fs.exists("/l"));
    assert!(fs.is_file("/l"));

    fs.write("/l", "fresh").unwrap();
    assert_eq!(read_string(&fs, "/real/f"), "fresh");
    assert_eq!(fs.size_of("/l").unwrap(), 5);
    assert_eq!(fs.diff("/l", "/real/f").unwrap(), "");
}

#[test]
fn test_relative_link_target_through_linked_directory() {
    let fs = setup();
    fs.mkdir_all("/real/sub").unwrap();
    fs.create("/real/f", "data").unwrap();
    fs.symlink("/real", "/alias").unwrap();
    fs.mkdir("/d").unwrap();
    fs.symlink("../alias/f", "/d/l").unwrap();
    fs.symlink("../alias/sub", "/d/s").unwrap();

    assert_eq!(read_string(&fs, "/d/l"), "data");
    fs.append("/d/l", "!").unwrap();
    assert_eq!(read_string(&fs, "/real/f"), "data!");

    fs.cd("/d/s").unwrap();
    assert_eq!(fs.pwd(), "/real/sub");
    fs.mkdir_all("/d/s/x/y").unwrap();
    assert!(fs.is_dir("/real/sub/x/y"));
}

#[test]
fn test_dangling_target_through_linked_directory() {
    let fs = setup();
    fs.mkdir("/real").unwrap();
    fs.symlink("/real", "/alias").unwrap();
    fs.symlink("/alias/gone", "/l").unwrap();

    assert_eq!(
        fs.read("/l"),
        Err(FsError::DanglingLink {
            link: "/l".into(),
            target: "/alias/gone".into()
        })
    );
    assert!(!fs.exists("/l"));

    fs.create("/alias/gone", "back").unwrap();
    assert_eq!(read_string(&fs, "/l"), "back");
}

#[test]
fn test_relative_target_survives_moving_its_directory() {
    let fs = setup();
    fs.mkdir("/d").unwrap();
    fs.create("/d/t", "x").unwrap();
    fs.symlink("t", "/d/l").unwrap();
    assert_eq!(read_string(&fs, "/d/l"), "x");

    fs.move_path("/d", "/e").unwrap();
    assert_eq!(fs.readlink("/e/l").unwrap(), "t");
    assert_eq!(read_string(&fs, "/e/l"), "x");
}

#[test]
fn test_dangling_link() {
    let fs = setup();
    fs.create("/target.txt", "content").unwrap();
    fs.symlink("/target.txt", "/link.txt").unwrap();
    fs.delete("/target.txt").unwrap();

    let err = fs.read("/link.txt").unwrap_err();
    assert_eq!(
        err,
        FsError::DanglingLink {
            link: "/link.txt".into(),
            target: "/target.txt".into()
        }
    );
    assert!(err.is_not_found());
    assert!(!fs.exists("/link.txt"));
    assert!(fs.is_symlink("/link.txt"));

    fs.delete("/link.txt").unwrap();
    assert!(!fs.is_symlink("/link.txt"));
}

#[test]
fn test_symlink_to_missing_target_is_allowed() {
    let fs = setup();
    fs.symlink("/later.txt", "/early").unwrap();
    assert!(!fs.exists("/early"));
    fs.create("/later.txt", "now").unwrap();
    assert_eq!(read_string(&fs, "/early"), "now");
}

#[test]
fn test_two_link_cycle() {
    let fs = setup();
    fs.symlink("/b", "/a").unwrap();
    fs.symlink("/a", "/b").unwrap();
    let err = fs.read("/a").unwrap_err();
    assert!(err.is_link_error());
    assert!(!fs.exists("/a"));
    assert!(fs.is_symlink("/a"));
}

#[test]
fn test_self_referencing_link() {
    let fs = setup();
    fs.symlink("/self", "/self").unwrap();
    assert_eq!(
        fs.read("/self"),
        Err(FsError::SymlinkCycle {
            path: "/self".into()
        })
    );
}

#[test]
fn test_directory_link_into_itself() {
    let fs = setup();
    fs.mkdir("/dir").unwrap();
    fs.symlink("/dir", "/dir/link").unwrap();
    assert!(fs.read("/dir/link/link/link/file.txt").unwrap_err().is_not_found());

    fs.create("/dir/file.txt", "found").unwrap();
    assert_eq!(read_string(&fs, "/dir/link/link/link/file.txt"), "found");
}

#[test]
fn test_hop_limit_is_configurable() {
    common::init_tracing();
    let fs = VirtualFs::with_config(FsConfig {
        max_symlink_hops: 3,
        ..FsConfig::default()
    });
    fs.create("/f", "end").unwrap();
    fs.symlink("/f", "/l1").unwrap();
    fs.symlink("/l1", "/l2").unwrap();
    fs.symlink("/l2", "/l3").unwrap();
    fs.symlink("/l3", "/l4").unwrap();

    assert_eq!(read_string(&fs, "/l3"), "end");
    assert_eq!(
        fs.read("/l4"),
        Err(FsError::TooManySymlinks {
            path: "/l4".into(),
            limit: 3
        })
    );
}

#[test]
fn test_is_symlink_and_readlink() {
    let fs = setup();
    fs.create("/target.txt", "").unwrap();
    fs.symlink("/target.txt", "/link.txt").unwrap();
    assert!(fs.is_symlink("/link.txt"));
    assert!(!fs.is_symlink("/target.txt"));
    assert_eq!(fs.readlink("/link.txt").unwrap(), "/target.txt");
    assert_eq!(
        fs.readlink("/target.txt"),
        Err(FsError::NotASymlink {
            path: "/target.txt".into()
        })
    );
    assert!(fs.readlink("/missing").unwrap_err().is_not_found());
}

#[test]
fn test_symlink_conflicts_and_bad_targets() {
    let fs = setup();
    fs.create("/file.txt", "").unwrap();
    assert_eq!(
        fs.symlink("/anything", "/file.txt"),
        Err(FsError::already_exists("/file.txt"))
    );
    assert!(matches!(
        fs.symlink("", "/empty"),
        Err(FsError::InvalidPath { .. })
    ));
    assert_eq!(
        fs.symlink("/file.txt", "/nodir/link"),
        Err(FsError::no_parent("/nodir/link"))
    );
}

#[test]
fn test_delete_link_to_directory_keeps_target() {
    let fs = setup();
    fs.mkdir("/real").unwrap();
    fs.create("/real/f", "x").unwrap();
    fs.symlink("/real", "/alias").unwrap();
    fs.delete("/alias").unwrap();
    assert!(!fs.is_symlink("/alias"));
    assert!(fs.exists("/real/f"));
}

#[test]
fn test_chmod_through_link_changes_target() {
    let fs = setup();
    fs.create("/target.txt", "secret").unwrap();
    fs.symlink("/target.txt", "/link.txt").unwrap();
    fs.chmod("/link.txt", Permissions::None).unwrap();
    assert_eq!(
        fs.metadata("/target.txt").unwrap().permissions,
        Some(Permissions::None)
    );
    assert_eq!(fs.read("/link.txt"), Err(FsError::access_denied("/target.txt")));
}

#[test]
fn test_metadata_reports_backing_path() {
    let fs = setup();
    fs.mkdir("/real").unwrap();
    fs.create("/real/f", "abc").unwrap();
    fs.symlink("/real", "/alias").unwrap();
    let meta = fs.metadata("/alias/f").unwrap();
    assert_eq!(meta.path, "/real/f");
    assert_eq!(meta.len, 3);
    assert_eq!(fs.size_of("/alias").unwrap(), 3);
}
