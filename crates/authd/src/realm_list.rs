// RealmList - realm advertisement
//
// A single realm, described by config, rendered into the wire block the
// client's realm picker understands.

use ashemu_shared::config::Config;
use ashemu_shared::util::ByteBuffer;
use ashemu_shared::WORLD_SERVER_PORT;

use crate::auth_codes::AuthCmd;

/// The advertised realm
#[derive(Debug, Clone)]
pub struct RealmInfo {
    pub name: String,
    pub address: String,
    pub id: u8,
}

impl RealmInfo {
    pub fn from_config(config: &Config) -> Self {
        RealmInfo {
            name: config.get_string_default("RealmName", "AshEmu"),
            address: config
                .get_string_default("RealmAddress", &format!("127.0.0.1:{}", WORLD_SERVER_PORT)),
            id: config.get_int_default("RealmId", 1) as u8,
        }
    }
}

/// Build the full REALM_LIST reply: opcode, u16 inner size, inner block.
pub fn realm_list_packet(realm: &RealmInfo) -> ByteBuffer {
    let mut inner = ByteBuffer::new();
    inner.write_u32(0); // unknown
    inner.write_u16(1); // realm count

    inner.write_u8(0); // realm type (0 = Normal)
    inner.write_u8(0); // lock
    inner.write_u8(0); // color
    inner.write_u8(0); // flags (0 = online)
    inner.write_cstring(&realm.name);
    inner.write_cstring(&realm.address);
    inner.write_f32(0.0); // population
    inner.write_u8(0); // character count
    inner.write_u8(1); // timezone
    inner.write_u8(realm.id);

    inner.write_u16(0x0010); // footer

    let mut pkt = ByteBuffer::new();
    pkt.write_u8(AuthCmd::RealmList as u8);
    pkt.write_u16(inner.size() as u16);
    pkt.append(inner.contents());
    pkt
}
