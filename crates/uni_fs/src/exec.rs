use std::io::Result as IoResult;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Any of the user/group/other execute bits.
const EXEC_BITS: u32 = 0o111;

/// Check whether `path` is a regular file with execute permission
/// for anyone at all.
///
/// Symlinks are followed, so a link to an executable counts.
/// Note that directories have their execute bits set and are
/// rejected by the regular-file check.
///
/// # Errors
///
/// Any error of the underlying metadata read.
pub fn is_executable( path: &Path ) -> IoResult<bool> {
    let metadata = path.metadata()?;
    let mode = metadata.permissions().mode();
    Ok( metadata.is_file() && mode & EXEC_BITS != 0 )
}

#[ cfg( test ) ]
#[ allow( clippy::unwrap_used ) ]
mod test {

    use std::fs::set_permissions;
    use std::fs::Permissions;
    use std::os::unix::fs::symlink;
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    fn chmod( path: &Path, mode: u32 ) {
        set_permissions( path, Permissions::from_mode( mode ) ).unwrap();
    }

    #[ test ]
    fn plain_file_is_not_executable() {
        let top = TempDir::new().unwrap();
        let file = top.child( "file" );
        file.touch().unwrap();
        chmod( file.path(), 0o644 );

        assert!( !is_executable( file.path() ).unwrap() );
    }

    #[ test ]
    fn exec_bit_makes_it_executable() {
        let top = TempDir::new().unwrap();
        let file = top.child( "tool" );
        file.write_str( "#!/bin/sh\n" ).unwrap();
        chmod( file.path(), 0o755 );

        assert!( is_executable( file.path() ).unwrap() );

        // a single execute bit is enough
        chmod( file.path(), 0o604 | 0o001 );
        assert!( is_executable( file.path() ).unwrap() );
    }

    #[ test ]
    fn directory_is_rejected() {
        let top = TempDir::new().unwrap();
        let dir = top.child( "dir" );
        dir.create_dir_all().unwrap();

        assert!( !is_executable( dir.path() ).unwrap() );
    }

    #[ test ]
    fn symlink_is_followed() {
        let top = TempDir::new().unwrap();
        let file = top.child( "tool" );
        file.write_str( "#!/bin/sh\n" ).unwrap();
        chmod( file.path(), 0o755 );

        let link = top.child( "alias" );
        symlink( file.path(), link.path() ).unwrap();

        assert!( is_executable( link.path() ).unwrap() );
    }
}
