//! User attribute definitions.
//!
//! Maps the logical attribute codes exposed through user profiles to the
//! table and column that store them, along with whether a profile may read
//! or write the attribute. Attributes marked read-only (email, phone, ...)
//! must be changed through dedicated endpoints that run their own checks.
//!
//! Attribute codes are unique per table only: `name` exists in both
//! [`AttributeTable::User`] and [`AttributeTable::Group`].

use serde::{Deserialize, Serialize};

/// Storage table holding an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeTable {
    /// `user`
    User,
    /// `user_detail`
    UserDetail,
    /// `grp`
    Group,
}

impl AttributeTable {
    /// Returns the physical table name.
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::UserDetail => "user_detail",
            Self::Group => "grp",
        }
    }
}

/// A known user or group attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum AttributeDefine {
    // user
    UserName,
    Email,
    Phone,
    StaffNo,
    LdapDn,
    UserGuid,

    // user_detail
    FirstName,
    LastName,
    DisplayName,
    NickName,
    IdentityCard,
    Motto,
    Image,
    Ssn,
    Weibo,
    WechatNo,
    Address,
    Birthday,
    Gender,
    Position,
    LastPositionModifyDate,
    Department,
    Title,
    Aid,
    EntryDate,
    LeaveDate,

    // grp
    GroupName,
    GroupCode,
    GroupDescription,
}

/// (table, attribute code, writable). Field name equals the code and every
/// attribute is readable.
struct Entry(AttributeTable, &'static str, bool);

impl AttributeDefine {
    const ALL: [Self; 29] = [
        Self::UserName,
        Self::Email,
        Self::Phone,
        Self::StaffNo,
        Self::LdapDn,
        Self::UserGuid,
        Self::FirstName,
        Self::LastName,
        Self::DisplayName,
        Self::NickName,
        Self::IdentityCard,
        Self::Motto,
        Self::Image,
        Self::Ssn,
        Self::Weibo,
        Self::WechatNo,
        Self::Address,
        Self::Birthday,
        Self::Gender,
        Self::Position,
        Self::LastPositionModifyDate,
        Self::Department,
        Self::Title,
        Self::Aid,
        Self::EntryDate,
        Self::LeaveDate,
        Self::GroupName,
        Self::GroupCode,
        Self::GroupDescription,
    ];

    const fn entry(self) -> Entry {
        use AttributeTable::{Group, User, UserDetail};

        match self {
            Self::UserName => Entry(User, "name", true),
            Self::Email => Entry(User, "email", false),
            Self::Phone => Entry(User, "phone", false),
            Self::StaffNo => Entry(User, "staff_no", false),
            Self::LdapDn => Entry(User, "ldap_dn", false),
            Self::UserGuid => Entry(User, "user_guid", false),
            Self::FirstName => Entry(UserDetail, "first_name", true),
            Self::LastName => Entry(UserDetail, "last_name", true),
            Self::DisplayName => Entry(UserDetail, "display_name", true),
            Self::NickName => Entry(UserDetail, "nick_name", true),
            Self::IdentityCard => Entry(UserDetail, "identity_card", true),
            Self::Motto => Entry(UserDetail, "motto", true),
            Self::Image => Entry(UserDetail, "image", true),
            Self::Ssn => Entry(UserDetail, "ssn", true),
            Self::Weibo => Entry(UserDetail, "weibo", true),
            Self::WechatNo => Entry(UserDetail, "wechat_no", true),
            Self::Address => Entry(UserDetail, "address", true),
            Self::Birthday => Entry(UserDetail, "birthday", true),
            Self::Gender => Entry(UserDetail, "gender", true),
            Self::Position => Entry(UserDetail, "position", true),
            Self::LastPositionModifyDate => Entry(UserDetail, "last_position_modify_date", true),
            Self::Department => Entry(UserDetail, "department", true),
            Self::Title => Entry(UserDetail, "title", true),
            Self::Aid => Entry(UserDetail, "aid", true),
            Self::EntryDate => Entry(UserDetail, "entry_date", true),
            Self::LeaveDate => Entry(UserDetail, "leave_date", true),
            Self::GroupName => Entry(Group, "name", true),
            Self::GroupCode => Entry(Group, "code", false),
            Self::GroupDescription => Entry(Group, "description", true),
        }
    }

    /// Returns every attribute in declaration order.
    pub const fn all() -> &'static [Self] {
        &Self::ALL
    }

    /// Table holding the attribute.
    pub const fn table(self) -> AttributeTable {
        self.entry().0
    }

    /// Logical attribute code exposed through profiles.
    pub const fn attribute_code(self) -> &'static str {
        self.entry().1
    }

    /// Column name in [`AttributeDefine::table`].
    pub const fn field_name(self) -> &'static str {
        self.entry().1
    }

    /// Whether profile reads include the attribute.
    pub const fn is_readable(self) -> bool {
        true
    }

    /// Whether profile updates may change the attribute.
    pub const fn is_writable(self) -> bool {
        self.entry().2
    }

    /// Finds the attribute stored in `table` under `code`.
    pub fn lookup(table: AttributeTable, code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.table() == table && a.attribute_code() == code)
    }

    /// Returns the attributes stored in `table`, in declaration order.
    pub fn for_table(table: AttributeTable) -> impl Iterator<Item = Self> {
        Self::ALL.iter().copied().filter(move |a| a.table() == table)
    }
}
