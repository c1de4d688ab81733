use botcomod_user::{ApproveOutcome, Command, PropertyKey, StartRegistrationInput};
use temp_dir::TempDir;

mod helpers;

#[tokio::test]
async fn approve_code_confirms_registration() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let pool = helpers::setup_test_pool(dir.child("db.sqlite3")).await?;
    let mut conn = pool.acquire().await?;

    let code = helpers::start_registration(&mut conn, 42, 4, "3").await?;
    let mut cmd = Command::new(&mut conn);
    let user = cmd.load(42).await?;
    let registration = user.pending_registration().unwrap();
    assert_eq!(registration.approve_code, code);
    assert_eq!(registration.invalid_codes.len(), 5);
    assert!(!registration.invalid_codes.contains(&code));

    let outcome = cmd.check_approve_code(42, 2, &code.to_lowercase()).await?;
    assert_eq!(outcome, ApproveOutcome::Confirmed);

    let user = cmd.load(42).await?;
    assert!(user.is_approved_resident);
    assert!(user.pending_registration().is_none());
    assert!(
        user.private_property
            .get(&PropertyKey::new(4, "3"))
            .unwrap()
            .approved
    );

    Ok(())
}

#[tokio::test]
async fn wrong_code_fails_registration() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let pool = helpers::setup_test_pool(dir.child("db.sqlite3")).await?;
    let mut conn = pool.acquire().await?;

    let code = helpers::start_registration(&mut conn, 42, 4, "3").await?;
    let wrong = if code == "11111" { "22222" } else { "11111" };

    let mut cmd = Command::new(&mut conn);
    assert_eq!(
        cmd.check_approve_code(42, 2, wrong).await?,
        ApproveOutcome::Failed
    );
    assert_eq!(
        cmd.check_approve_code(42, 3, &code).await?,
        ApproveOutcome::NoPendingRegistration
    );

    let user = cmd.load(42).await?;
    assert!(!user.is_approved_resident);
    assert!(user.private_property.is_empty());

    Ok(())
}

#[tokio::test]
async fn second_registration_is_rejected_while_pending() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let pool = helpers::setup_test_pool(dir.child("db.sqlite3")).await?;
    let mut conn = pool.acquire().await?;

    helpers::start_registration(&mut conn, 42, 4, "3").await?;
    let err = helpers::start_registration(&mut conn, 42, 4, "5")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "registration already started");

    Ok(())
}

#[tokio::test]
async fn empty_apartment_is_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let pool = helpers::setup_test_pool(dir.child("db.sqlite3")).await?;
    let mut conn = pool.acquire().await?;

    let err = Command::new(&mut conn)
        .start_registration(StartRegistrationInput {
            user_id: 1,
            update_id: 1,
            house_id: 4,
            house_number: "4".to_owned(),
            apartment: "  ".to_owned(),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        botcomod_shared::Error::Validate(errors) if errors.field_errors().contains_key("apartment")
    ));

    let err = Command::new(&mut conn)
        .start_registration(StartRegistrationInput {
            user_id: 1,
            update_id: 2,
            house_id: 4,
            house_number: "4".to_owned(),
            apartment: "123456789".to_owned(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, botcomod_shared::Error::Validate(_)));

    let user = Command::new(&mut conn).load(1).await?;
    assert!(user.registration.is_none());

    Ok(())
}

#[tokio::test]
async fn admin_confirmation_is_a_no_op_without_pending() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let pool = helpers::setup_test_pool(dir.child("db.sqlite3")).await?;
    let mut conn = pool.acquire().await?;

    let mut cmd = Command::new(&mut conn);
    cmd.confirm_registration(7, 1, "receipt").await?;
    cmd.confirm_registration(7, 2, "receipt").await?;

    let user = cmd.load(7).await?;
    assert!(!user.is_approved_resident);
    assert_eq!(cmd.events(7).await?.len(), 2);

    Ok(())
}
