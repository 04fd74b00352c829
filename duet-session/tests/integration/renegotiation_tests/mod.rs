mod test_attach_media_renegotiates;
mod test_incoming_renegotiation_offer;
