use tower_sessions::Session;

use crate::error::SnapError;

const FLASH_FLAG_KEY: &str = "flash_flag";

pub(crate) const FLASH_INVALID_PASSWORD: u16 = 1;
pub(crate) const FLASH_AUTH_REQUIRED: u16 = 2;
pub(crate) const FLASH_LOGGED_OUT: u16 = 3;

#[derive(Clone, Debug)]
pub(crate) struct FlashMessage {
    pub(crate) text: &'static str,
    pub(crate) class: &'static str,
}

pub(crate) async fn set_flash(session: &Session, flag: u16) -> Result<(), SnapError> {
    session.insert(FLASH_FLAG_KEY, flag).await?;
    Ok(())
}

pub(crate) async fn take_flash_message(
    session: &Session,
) -> Result<Option<FlashMessage>, SnapError> {
    let flag = session
        .get::<u16>(FLASH_FLAG_KEY)
        .await?
        .filter(|flag| *flag != 0);
    if flag.is_some() {
        session.insert(FLASH_FLAG_KEY, 0u16).await?;
    }
    Ok(flag.and_then(message_for))
}

fn message_for(flag: u16) -> Option<FlashMessage> {
    match flag {
        FLASH_INVALID_PASSWORD => Some(FlashMessage {
            text: "Wrong password, please try again.",
            class: "error",
        }),
        FLASH_AUTH_REQUIRED => Some(FlashMessage {
            text: "Please log in to generate images.",
            class: "warning",
        }),
        FLASH_LOGGED_OUT => Some(FlashMessage {
            text: "You have been logged out.",
            class: "success",
        }),
        _ => None,
    }
}
