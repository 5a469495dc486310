/// The signed-in administrator as the commit gate sees them.
#[derive(Clone, Debug, PartialEq)]
pub struct AdminIdentity {
    pub id: u32,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug)]
pub struct AdminRecord {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub admin: bool,
}
