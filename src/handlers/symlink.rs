//! Symlink handler: the two-hop chain from `$HOME` into the pack.
//!
//! The user-visible link points at an intermediate link under
//! `deployed/symlink/`, which points at the pack file. The indirection is
//! what lets status and clear recognize files dodot owns without a
//! manifest, and lets packs move without touching the user's home.

use anyhow::Result;

use crate::actions::Action;
use crate::packs::Pack;
use crate::paths::mapping;

use super::{FileInput, HandlerCtx, HandlerKind, HandlerState, HandlerStatus};

/// Compute the user-visible target for a matched file, honoring an explicit
/// `target` rule option over the mapping layers.
fn target_for(input: &FileInput, ctx: &HandlerCtx<'_>) -> std::path::PathBuf {
    if let Some(target) = input.options.get("target").and_then(toml::Value::as_str) {
        return mapping::expand_target(ctx.paths, target);
    }
    mapping::map_pack_file_to_system(ctx.paths, ctx.config, &input.relative_path)
}

/// Plan the two-hop link for one pack file.
///
/// # Errors
///
/// This planner is infallible in practice; the conflict handling lives in
/// the action runner so that dry runs never fail on occupied targets.
pub fn deploy(input: &FileInput, ctx: &HandlerCtx<'_>) -> Result<Action> {
    Ok(Action::LinkFile {
        pack: input.pack_name.clone(),
        relative: input.relative_path.clone(),
        source: input.source_path.clone(),
        target: target_for(input, ctx),
    })
}

/// Report the state of the two-hop chain.
///
/// # Errors
///
/// Never fails; broken states are reported through the status value.
pub fn check_status(input: &FileInput, ctx: &HandlerCtx<'_>) -> Result<HandlerStatus> {
    let intermediate = ctx.datastore.intermediate_link_path(
        &input.pack_name,
        HandlerKind::Symlink.name(),
        &input.relative_path,
    );
    let target = target_for(input, ctx);

    if !ctx.fs.lexists(&intermediate) {
        return Ok(HandlerStatus::new(
            HandlerState::Pending,
            format!("will be linked to {}", target.display()),
        ));
    }

    match ctx.fs.read_link(&intermediate) {
        Ok(points_at) if points_at == input.source_path => {
            if ctx.fs.read_link(&target).is_ok_and(|t| t == intermediate) {
                Ok(HandlerStatus::new(HandlerState::Ready, "linked"))
            } else {
                Ok(HandlerStatus::new(HandlerState::Pending, "not linked"))
            }
        }
        Ok(_) => Ok(HandlerStatus::new(
            HandlerState::Error,
            "link points to wrong source",
        )),
        Err(_) => Ok(HandlerStatus::new(
            HandlerState::Error,
            "intermediate link is unreadable",
        )),
    }
}

/// Remove the intermediate tree and every user-visible link that resolves
/// into it.
///
/// # Errors
///
/// Returns an error if existing state cannot be removed.
pub fn clear(pack: &Pack, ctx: &HandlerCtx<'_>) -> Result<()> {
    let intermediate_root = ctx.paths.deployed_symlink_dir();
    for (relative, _link) in ctx
        .datastore
        .list_intermediate_links(&pack.name, HandlerKind::Symlink.name())?
    {
        let target = mapping::map_pack_file_to_system(ctx.paths, &pack.config, &relative);
        let ours = ctx
            .fs
            .read_link(&target)
            .is_ok_and(|t| t.starts_with(&intermediate_root));
        if ours {
            ctx.fs.remove_file(&target).map_err(|source| {
                crate::error::HandlerError::FileAccess {
                    path: target.clone(),
                    source,
                }
            })?;
        }
    }
    ctx.datastore.clear_symlink_state(&pack.name)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checksum::ChecksumCache;
    use crate::config::PackConfig;
    use crate::datastore::Datastore;
    use crate::fsys::{FileSystem, MemoryFileSystem};
    use crate::paths::{Env, Paths};
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    struct Fixture {
        fs: MemoryFileSystem,
        paths: Paths,
        config: PackConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let fs = MemoryFileSystem::new();
            fs.create_dir_all(Path::new("/dotfiles/vim")).unwrap();
            fs.create_dir_all(Path::new("/home/user")).unwrap();
            fs.write(Path::new("/dotfiles/vim/vimrc"), b"set number")
                .unwrap();
            let paths = Paths::resolve_with(
                Some(Path::new("/dotfiles")),
                &Env::empty().with_var("HOME", "/home/user"),
                Path::new("/cwd"),
                None,
            )
            .unwrap();
            Self {
                fs,
                paths,
                config: PackConfig::default(),
            }
        }

        fn input(&self) -> FileInput {
            FileInput {
                pack_name: "vim".to_string(),
                source_path: PathBuf::from("/dotfiles/vim/vimrc"),
                relative_path: PathBuf::from("vimrc"),
                options: BTreeMap::new(),
            }
        }

        fn pack(&self) -> Pack {
            Pack {
                name: "vim".to_string(),
                path: PathBuf::from("/dotfiles/vim"),
                config: self.config.clone(),
                ignored: false,
            }
        }
    }

    fn with_ctx<R>(fx: &Fixture, f: impl FnOnce(&HandlerCtx<'_>) -> R) -> R {
        let datastore = Datastore::new(&fx.fs, &fx.paths);
        let checksums = ChecksumCache::new();
        let ctx = HandlerCtx {
            fs: &fx.fs,
            paths: &fx.paths,
            datastore: &datastore,
            checksums: &checksums,
            config: &fx.config,
            force: false,
        };
        f(&ctx)
    }

    #[test]
    fn deploy_plans_mapped_target() {
        let fx = Fixture::new();
        let action = with_ctx(&fx, |ctx| deploy(&fx.input(), ctx)).unwrap();
        match action {
            Action::LinkFile { target, source, .. } => {
                assert_eq!(target, Path::new("/home/user/.vimrc"));
                assert_eq!(source, Path::new("/dotfiles/vim/vimrc"));
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn deploy_honors_target_option() {
        let fx = Fixture::new();
        let mut input = fx.input();
        input.options.insert(
            "target".to_string(),
            toml::Value::String("$HOME/.config/vim/vimrc".to_string()),
        );
        let action = with_ctx(&fx, |ctx| deploy(&input, ctx)).unwrap();
        match action {
            Action::LinkFile { target, .. } => {
                assert_eq!(target, Path::new("/home/user/.config/vim/vimrc"));
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn status_pending_before_any_deployment() {
        let fx = Fixture::new();
        let status = with_ctx(&fx, |ctx| check_status(&fx.input(), ctx)).unwrap();
        assert_eq!(status.state, HandlerState::Pending);
        assert!(status.message.contains("will be linked to"));
        assert!(status.message.contains(".vimrc"));
    }

    #[test]
    fn status_ready_when_both_hops_exist() {
        let fx = Fixture::new();
        with_ctx(&fx, |ctx| {
            let link = ctx
                .datastore
                .create_intermediate_link(
                    "vim",
                    "symlink",
                    Path::new("vimrc"),
                    Path::new("/dotfiles/vim/vimrc"),
                    false,
                )
                .unwrap();
            fx.fs.symlink(&link, Path::new("/home/user/.vimrc")).unwrap();

            let status = check_status(&fx.input(), ctx).unwrap();
            assert_eq!(status.state, HandlerState::Ready);
            assert_eq!(status.message, "linked");
        });
    }

    #[test]
    fn status_pending_when_user_link_missing() {
        let fx = Fixture::new();
        with_ctx(&fx, |ctx| {
            ctx.datastore
                .create_intermediate_link(
                    "vim",
                    "symlink",
                    Path::new("vimrc"),
                    Path::new("/dotfiles/vim/vimrc"),
                    false,
                )
                .unwrap();
            let status = check_status(&fx.input(), ctx).unwrap();
            assert_eq!(status.state, HandlerState::Pending);
            assert_eq!(status.message, "not linked");
        });
    }

    #[test]
    fn status_error_when_intermediate_points_elsewhere() {
        let fx = Fixture::new();
        with_ctx(&fx, |ctx| {
            let link = ctx.datastore.intermediate_link_path(
                "vim",
                "symlink",
                Path::new("vimrc"),
            );
            fx.fs.create_dir_all(link.parent().unwrap()).unwrap();
            fx.fs.symlink(Path::new("/tmp/other"), &link).unwrap();

            let status = check_status(&fx.input(), ctx).unwrap();
            assert_eq!(status.state, HandlerState::Error);
            assert_eq!(status.message, "link points to wrong source");
        });
    }

    #[test]
    fn clear_removes_both_hops_but_not_foreign_files() {
        let fx = Fixture::new();
        with_ctx(&fx, |ctx| {
            let link = ctx
                .datastore
                .create_intermediate_link(
                    "vim",
                    "symlink",
                    Path::new("vimrc"),
                    Path::new("/dotfiles/vim/vimrc"),
                    false,
                )
                .unwrap();
            fx.fs.symlink(&link, Path::new("/home/user/.vimrc")).unwrap();
            // A user file that happens to collide with another relpath.
            fx.fs.write(Path::new("/home/user/.gvimrc"), b"mine").unwrap();

            clear(&fx.pack(), ctx).unwrap();

            assert!(!fx.fs.lexists(Path::new("/home/user/.vimrc")));
            assert!(!fx.fs.lexists(&link));
            assert_eq!(fx.fs.read(Path::new("/home/user/.gvimrc")).unwrap(), b"mine");
            // Pack file untouched.
            assert_eq!(
                fx.fs.read(Path::new("/dotfiles/vim/vimrc")).unwrap(),
                b"set number"
            );
        });
    }

    #[test]
    fn clear_without_state_is_a_no_op() {
        let fx = Fixture::new();
        with_ctx(&fx, |ctx| clear(&fx.pack(), ctx)).unwrap();
    }

    #[test]
    fn clear_keeps_user_replaced_targets() {
        let fx = Fixture::new();
        with_ctx(&fx, |ctx| {
            ctx.datastore
                .create_intermediate_link(
                    "vim",
                    "symlink",
                    Path::new("vimrc"),
                    Path::new("/dotfiles/vim/vimrc"),
                    false,
                )
                .unwrap();
            // The user replaced the managed link with a real file.
            fx.fs.write(Path::new("/home/user/.vimrc"), b"handmade").unwrap();

            clear(&fx.pack(), ctx).unwrap();
            assert_eq!(
                fx.fs.read(Path::new("/home/user/.vimrc")).unwrap(),
                b"handmade"
            );
        });
    }
}
