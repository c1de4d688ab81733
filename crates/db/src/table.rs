use sea_query::Iden;

#[derive(Iden, Clone)]
pub enum User {
    Table,
    Id,
    Username,
}

#[derive(Iden, Clone)]
pub enum UserEvent {
    Table,
    User,
    Timestamp,
    Id,
    Type,
    Event,
}

#[derive(Iden, Clone)]
pub enum House {
    Table,
    Id,
    Number,
    Construction,
    RoomsMin,
    RoomsMax,
}

#[derive(Iden, Clone)]
pub enum UpdatesLog {
    Table,
    Id,
    Timestamp,
    Update,
}
