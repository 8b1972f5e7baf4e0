//! End-to-end teardown scenarios.

mod common;

use common::TestEnv;
use dodot_cli::datastore::Datastore;
use dodot_cli::handlers::HandlerKind;

fn populated_env() -> TestEnv {
    let env = TestEnv::new();
    env.pack("vim");
    env.write_pack_file("vim", "vimrc", "set number");
    env.write_pack_file("vim", "aliases.sh", "alias v=vim");
    env.write_pack_file("vim", "install.sh", "#!/bin/sh\n");
    env.write_pack_file("vim", "bin/vimdiff-wrapper", "#!/bin/sh\n");
    env
}

#[test]
fn off_clears_every_handler_and_user_links() {
    let env = populated_env();
    let on = env.on(&["vim"]);
    assert_eq!(on.failed, 0);
    assert!(env.home().join(".vimrc").is_symlink());

    let off = env.off(&["vim"]);
    assert_eq!(off.failed, 0);

    let datastore = Datastore::new(&env.fs, &env.paths);
    for kind in HandlerKind::ALL {
        assert!(
            !datastore.has_handler_state("vim", kind),
            "{} state should be cleared",
            kind.name()
        );
    }
    assert!(!env.home().join(".vimrc").exists());
    // Pack sources are untouched.
    assert_eq!(
        std::fs::read(env.root().join("vim/vimrc")).expect("pack file"),
        b"set number"
    );
}

#[test]
fn off_twice_is_a_successful_no_op() {
    let env = populated_env();
    env.on(&["vim"]);

    let first = env.off(&["vim"]);
    assert_eq!(first.failed, 0);

    let second = env.off(&["vim"]);
    assert_eq!(second.failed, 0);
    assert!(second.pack_results[0].success);
    assert_eq!(second.pack_results[0].deployed, 0);
    assert!(second.pack_results[0].error.is_none());
}

#[test]
fn off_respects_files_outside_the_intermediate_tree() {
    let env = populated_env();
    env.on(&["vim"]);

    // Replace the managed link with the user's own file.
    std::fs::remove_file(env.home().join(".vimrc")).expect("remove link");
    std::fs::write(env.home().join(".vimrc"), "handmade").expect("write own file");

    let off = env.off(&["vim"]);
    assert_eq!(off.failed, 0);
    assert_eq!(
        std::fs::read(env.home().join(".vimrc")).expect("user file"),
        b"handmade"
    );
}

#[test]
fn off_only_touches_selected_packs() {
    let env = populated_env();
    env.pack("zsh");
    env.write_pack_file("zsh", "zshrc", "setopt autocd");
    env.on(&[]);

    let off = env.off(&["vim"]);
    assert_eq!(off.failed, 0);

    assert!(!env.home().join(".vimrc").exists());
    assert!(env.home().join(".zshrc").is_symlink());
}

#[test]
fn ignored_pack_is_skipped_by_off() {
    let env = populated_env();
    env.on(&["vim"]);
    env.write_pack_file("vim", ".dodotignore", "");

    let off = env.off(&["vim"]);
    assert_eq!(off.failed, 0);
    // State stays because the pack is now ignored.
    let datastore = Datastore::new(&env.fs, &env.paths);
    assert!(datastore.has_handler_state("vim", HandlerKind::Symlink));
}
