#![ allow( clippy::unwrap_used ) ]
#![ allow( clippy::expect_used ) ]

use assert_fs::TempDir;
use assert_fs::fixture::ChildPath;
use assert_fs::prelude::*;
use tap::Tap;

use std::fs::Permissions;
use std::fs::set_permissions;
use std::os::unix::fs::PermissionsExt;
use std::process::Command;
use std::process::Output;

fn main_program() -> Command {
    let exe = std::env!( "CARGO_BIN_EXE_unipath" );
    std::process::Command::new( exe )
}

macro_rules! create_tempdir {
    () => { {
        TempDir::new().expect( "Failed to setup tempdir" )
    } };
}

fn make_dir( top: &TempDir, name: &str ) -> ChildPath {
    top.child( name )
        .tap( |it| it.create_dir_all().unwrap() )
}

fn install_tool( dir: &ChildPath, name: &str, body: &str ) {
    let file = dir.child( name );
    file.write_str( body ).unwrap();
    set_permissions( file.path(), Permissions::from_mode( 0o755 ) )
        .unwrap();
}

fn stdout_of( output: &Output ) -> String {
    String::from_utf8_lossy( &output.stdout ).into_owned()
}

fn stderr_of( output: &Output ) -> String {
    String::from_utf8_lossy( &output.stderr ).into_owned()
}

#[ test ]
fn print_unifies_and_dedups() {
    let top = create_tempdir!();
    let one = make_dir( &top, "one" );
    let two = make_dir( &top, "two" );
    let home = make_dir( &top, "home" );
    let local_bin = home.child( ".local/bin" )
        .tap( |it| it.create_dir_all().unwrap() );
    let missing = top.child( "missing" );

    // a duplicate, an empty segment and a missing directory
    let path_env = format! {
        "{0}::{1}:{0}:{2}",
        one.path().display(),
        two.path().display(),
        missing.path().display(),
    };

    let output = main_program()
        .arg( "--print" )
        .env( "PATH", &path_env )
        .env( "HOME", home.path() )
        .output().unwrap();

    assert!( output.status.success() );

    let stdout = stdout_of( &output );
    let line = stdout.trim_end();

    let head = format! {
        "{}:{}",
        one.path().display(),
        two.path().display(),
    };
    assert!( line.starts_with( &head ), "unexpected head: {line}" );

    let one_str = one.path().display().to_string();
    assert_eq!( line.matches( &one_str ).count(), 1 );

    let missing_str = missing.path().display().to_string();
    assert!( !line.contains( &missing_str ) );

    assert!( !line.contains( "::" ) );
    assert!( !line.ends_with( ':' ) );

    let local_str = local_bin.path().display().to_string();
    assert!( line.contains( &local_str ), "home group missing: {line}" );
}

#[ test ]
fn completion_prints_matching_executables() {
    let top = create_tempdir!();
    let bin = make_dir( &top, "bin" );
    let home = make_dir( &top, "home" );

    install_tool( &bin, "zq-lorem", "#!/bin/sh\nexit 0\n" );
    install_tool( &bin, "zq-lopsum", "#!/bin/sh\nexit 0\n" );
    install_tool( &bin, "other", "#!/bin/sh\nexit 0\n" );
    // right prefix, no exec bit
    bin.child( "zq-lonot" ).write_str( "plain data" ).unwrap();

    for selector in [ vec![ "-", "zq-lo" ], vec![ "--complete", "zq-lo" ] ] {
        let output = main_program()
            .args( &selector )
            .env( "PATH", bin.path() )
            .env( "HOME", home.path() )
            .output().unwrap();

        assert!( output.status.success() );

        let stdout = stdout_of( &output );
        let mut names = stdout.lines()
            .filter( |it| it.starts_with( "zq-" ) )
            .collect::<Vec<_>>();
        names.sort_unstable();

        assert_eq!( names, [ "zq-lopsum", "zq-lorem" ] );
        assert!( !stdout.lines().any( |it| it == "other" ) );
    }
}

#[ test ]
fn executes_command_with_arguments_passed_through() {
    let top = create_tempdir!();
    let home = make_dir( &top, "home" );

    let output = main_program()
        .args( [ "sh", "-c", "exit 7" ] )
        .env( "PATH", "/usr/bin:/bin" )
        .env( "HOME", home.path() )
        .output().unwrap();

    assert_eq!( output.status.code(), Some( 7 ) );

    let output = main_program()
        .args( [ "--", "sh", "-c", r#"printf %s "$1""#, "argv0", "hello" ] )
        .env( "PATH", "/usr/bin:/bin" )
        .env( "HOME", home.path() )
        .output().unwrap();

    assert!( output.status.success() );
    assert_eq!( stdout_of( &output ), "hello" );
}

#[ test ]
fn installs_unified_path_unless_preserved() {
    let top = create_tempdir!();
    let one = make_dir( &top, "one" );
    let home = make_dir( &top, "home" );

    let one_str = one.path().display().to_string();
    let path_env = format!( "{one_str}:{one_str}:/usr/bin:/bin" );

    let probe = [ "sh", "-c", r#"printf %s "$PATH""# ];

    let output = main_program()
        .args( probe )
        .env( "PATH", &path_env )
        .env( "HOME", home.path() )
        .output().unwrap();

    assert!( output.status.success() );
    let child_path = stdout_of( &output );
    // deduplicated: the doubled entry collapsed
    assert!( child_path.starts_with( &format!( "{one_str}:" ) ) );
    assert_eq!( child_path.matches( &one_str ).count(), 1 );

    let output = main_program()
        .arg( "--preserve-env" )
        .args( probe )
        .env( "PATH", &path_env )
        .env( "HOME", home.path() )
        .output().unwrap();

    assert!( output.status.success() );
    // untouched, duplicate and all
    assert_eq!( stdout_of( &output ), path_env );
}

#[ test ]
fn slashed_command_runs_verbatim() {
    let top = create_tempdir!();
    let home = make_dir( &top, "home" );
    let tools = make_dir( &top, "tools" );
    install_tool( &tools, "ret3.sh", "#!/bin/sh\nexit 3\n" );

    let output = main_program()
        .arg( "./tools/ret3.sh" )
        .current_dir( top.path() )
        .env( "PATH", "/usr/bin:/bin" )
        .env( "HOME", home.path() )
        .output().unwrap();

    assert_eq!( output.status.code(), Some( 3 ) );
}

#[ test ]
fn missing_command_reports_and_exits_one() {
    let top = create_tempdir!();
    let home = make_dir( &top, "home" );

    let output = main_program()
        .arg( "zq-surely-not-installed" )
        .env( "PATH", "/usr/bin:/bin" )
        .env( "HOME", home.path() )
        .output().unwrap();

    assert_eq!( output.status.code(), Some( 1 ) );
    assert!( stderr_of( &output ).contains( "not found" ) );
}

#[ test ]
fn no_command_is_an_error() {
    let top = create_tempdir!();
    let home = make_dir( &top, "home" );

    let output = main_program()
        .env( "PATH", "/usr/bin:/bin" )
        .env( "HOME", home.path() )
        .output().unwrap();

    assert_eq!( output.status.code(), Some( 1 ) );
    assert!( stderr_of( &output ).contains( "No command" ) );
}

#[ test ]
fn dash_completion_wants_exactly_one_prefix() {
    let top = create_tempdir!();
    let home = make_dir( &top, "home" );

    let output = main_program()
        .args( [ "-", "zq", "extra" ] )
        .env( "PATH", "/usr/bin:/bin" )
        .env( "HOME", home.path() )
        .output().unwrap();

    assert_eq!( output.status.code(), Some( 1 ) );
}

#[ test ]
fn informational_flags_exit_zero() {
    let help = main_program().arg( "--help" ).output().unwrap();
    assert!( help.status.success() );
    assert!( stdout_of( &help ).contains( "Usage" ) );

    for flag in [ "--copying", "--copyright", "-c" ] {
        let output = main_program().arg( flag ).output().unwrap();
        assert!( output.status.success() );
        assert! {
            stdout_of( &output )
                .contains( "GNU General Public License" )
        };
    }

    let warranty = main_program().arg( "--warranty" ).output().unwrap();
    assert!( warranty.status.success() );
    assert!( stdout_of( &warranty ).contains( "WITHOUT ANY WARRANTY" ) );
}
