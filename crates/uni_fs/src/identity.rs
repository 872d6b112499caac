use std::io::Result as IoResult;
use std::path::Path;

use tracing::trace;

/// The (device, inode) pair naming the filesystem object behind
/// a path. Two different path strings denote the same directory
/// iff their identities are equal, which catches symlinks and
/// bind mounts that string comparison never can.
#[ derive( Clone, Copy, PartialEq, Eq, Debug ) ]
pub struct DirIdentity {
    dev: u64,
    ino: u64,
}

impl DirIdentity {
    /// Stat `path` (symlinks followed) and read its identity.
    ///
    /// # Errors
    ///
    /// Any error of the underlying stat, notably
    /// [`std::io::ErrorKind::NotFound`] when the path does not exist.
    pub fn of( path: &Path ) -> IoResult<Self> {
        trace!( ?path, "stat for identity" );
        let stat = rustix::fs::stat( path )?;
        Ok( Self { dev: stat.st_dev, ino: stat.st_ino } )
    }

    /// The inode number, which is what bucket selection hashes on.
    #[ must_use ]
    pub const fn ino( &self ) -> u64 {
        self.ino
    }
}

#[ cfg( test ) ]
#[ allow( clippy::unwrap_used ) ]
mod test {

    use std::os::unix::fs::symlink;

    use super::*;

    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    #[ test ]
    fn symlink_shares_identity() {
        let top = TempDir::new().unwrap();

        let dir = top.child( "dir" );
        dir.create_dir_all().unwrap();
        let link = top.child( "link" );
        symlink( dir.path(), link.path() ).unwrap();

        let of_dir = DirIdentity::of( dir.path() ).unwrap();
        let of_link = DirIdentity::of( link.path() ).unwrap();

        assert_eq!( of_dir, of_link );
    }

    #[ test ]
    fn distinct_dirs_differ() {
        let top = TempDir::new().unwrap();

        let one = top.child( "one" );
        one.create_dir_all().unwrap();
        let two = top.child( "two" );
        two.create_dir_all().unwrap();

        assert_ne! {
            DirIdentity::of( one.path() ).unwrap(),
            DirIdentity::of( two.path() ).unwrap(),
        };
    }

    #[ test ]
    fn missing_path_is_not_found() {
        let top = TempDir::new().unwrap();
        let nowhere = top.child( "nowhere" );

        let err = DirIdentity::of( nowhere.path() ).unwrap_err();
        assert_eq!( err.kind(), std::io::ErrorKind::NotFound );
    }
}
